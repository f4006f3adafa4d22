//! Blame resolution: mapping a `(file, line)` to the commit that most
//! recently touched it, following renames.

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::commands::{git_command, GitError};

/// The commit that introduced or last touched a specific line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlameResult {
    /// Full commit SHA.
    pub commit_id: String,
    /// Author name at that commit.
    pub author_name: String,
    /// Author email at that commit.
    pub author_email: String,
    /// Commit timestamp.
    pub timestamp: DateTime<Utc>,
    /// First line of the commit message.
    pub summary: String,
}

const FIELD_SEP: char = '\x1f';

/// Resolves `(file_path, line_number)` at `rev` (defaults to `HEAD`) to the
/// commit that last changed that line.
///
/// Uses `git log --follow -L<line>,<line>:<file>`, which walks the line's
/// history across renames rather than stopping at the commit that
/// introduced the file's current name. Only the newest matching commit is
/// requested (`-n 1`).
pub fn blame_line(
    repo_path: &Path,
    file_path: &str,
    line_number: u32,
    rev: Option<&str>,
) -> Result<BlameResult, GitError> {
    let rev = rev.unwrap_or("HEAD");
    let range = format!("-L{line_number},{line_number}:{file_path}");
    let format = format!("--format={}", ["%H", "%an", "%ae", "%aI", "%s"].join(&FIELD_SEP.to_string()));

    let output = git_command(
        &["log", "--follow", "-n", "1", &format, &range, rev],
        repo_path,
    )?;

    parse_blame_output(&output)
}

fn parse_blame_output(output: &str) -> Result<BlameResult, GitError> {
    let header = output
        .lines()
        .next()
        .ok_or_else(|| GitError::CommandFailed { code: None, stderr: "empty blame output".to_string() })?;

    let fields: Vec<&str> = header.split(FIELD_SEP).collect();
    if fields.len() != 5 {
        return Err(GitError::CommandFailed {
            code: None,
            stderr: format!("unexpected blame header: {header}"),
        });
    }

    let timestamp = DateTime::parse_from_rfc3339(fields[3])
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now());

    Ok(BlameResult {
        commit_id: fields[0].to_string(),
        author_name: fields[1].to_string(),
        author_email: fields[2].to_string(),
        timestamp,
        summary: fields[4].to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blame_this_file_first_line() {
        // `cargo test` runs with the crate directory as cwd, which is itself
        // inside the workspace's git repository.
        let result = blame_line(Path::new("."), "src/blame.rs", 1, None);
        assert!(result.is_ok(), "blame should resolve: {result:?}");
        let blame = result.unwrap();
        assert_eq!(blame.commit_id.len(), 40);
    }

    #[test]
    fn parse_blame_output_rejects_empty() {
        assert!(parse_blame_output("").is_err());
    }

    #[test]
    fn parse_blame_output_parses_fields() {
        let line = format!("abc123{FIELD_SEP}Jane{FIELD_SEP}jane@example.com{FIELD_SEP}2024-01-01T00:00:00+00:00{FIELD_SEP}Initial commit");
        let result = parse_blame_output(&line).unwrap();
        assert_eq!(result.commit_id, "abc123");
        assert_eq!(result.author_name, "Jane");
        assert_eq!(result.summary, "Initial commit");
    }
}
