//! Transparent zstd compression envelope for the on-disk store file.
//!
//! A store can live on disk as a plain `graph.db` or a compressed
//! `graph.db.zst`. Opening a compressed envelope decompresses it into a
//! scratch file that [`SqliteStore`](crate::sqlite::SqliteStore) opens
//! normally; closing it recompresses the scratch file back over the
//! envelope path. Every other component only ever sees an open
//! `rusqlite::Connection` and is unaware compression happened.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Result, StoreError};

/// zstd compression level used for the envelope. Favors fast
/// compress/decompress over maximum ratio, since this runs on every
/// open/close rather than once.
const COMPRESSION_LEVEL: i32 = 3;

/// `true` if `path`'s extension indicates a compressed envelope.
pub fn is_compressed(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "zst")
}

/// Decompresses `envelope_path` into a fresh temp file and returns it.
/// The caller opens a [`rusqlite::Connection`] against the returned
/// path and must call [`compress_back`] with the same handle before the
/// temp file is dropped, or changes are lost.
pub fn decompress_to_temp(envelope_path: &Path) -> Result<NamedTempFile> {
    let temp = NamedTempFile::new()?;
    let mut reader = BufReader::new(File::open(envelope_path)?);
    let mut writer = BufWriter::new(temp.reopen()?);
    zstd::stream::copy_decode(&mut reader, &mut writer)
        .map_err(|e| StoreError::Compression(format!("failed to decompress {}: {e}", envelope_path.display())))?;
    Ok(temp)
}

/// Compresses the scratch file at `temp_path` back over `envelope_path`.
pub fn compress_back(temp_path: &Path, envelope_path: &Path) -> Result<()> {
    let mut reader = BufReader::new(File::open(temp_path)?);
    let mut writer = BufWriter::new(File::create(envelope_path)?);
    zstd::stream::copy_encode(&mut reader, &mut writer, COMPRESSION_LEVEL)
        .map_err(|e| StoreError::Compression(format!("failed to compress {}: {e}", envelope_path.display())))?;
    Ok(())
}

/// Compresses the database at `db_path` into `<db_path>.zst`, used by
/// the export path to ship a deterministic compressed snapshot.
pub fn compress_file(db_path: &Path) -> Result<PathBuf> {
    let out_path = PathBuf::from(format!("{}.zst", db_path.display()));
    compress_back(db_path, &out_path)?;
    Ok(out_path)
}
