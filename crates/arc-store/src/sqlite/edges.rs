//! Edge CRUD and close-and-reinsert upsert logic for [`SqliteStore`].

use std::collections::BTreeMap;

use arc_model::content_hash::edge_content_hash;
use arc_model::edge::Edge;
use arc_model::enums::EdgeRel;
use arc_model::temporal::Bitemporal;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

use crate::error::{Result, StoreError};
use crate::sqlite::nodes::{format_datetime, parse_datetime};
use crate::sqlite::store::SqliteStore;

pub(crate) const EDGE_COLUMNS: &str =
    "src_id, dst_id, rel, properties, source, content_hash, valid_from, valid_to, tx_from, tx_to";

pub(crate) fn scan_edge(row: &Row) -> rusqlite::Result<Edge> {
    let properties_json: String = row.get("properties")?;
    let properties: BTreeMap<String, serde_json::Value> =
        serde_json::from_str(&properties_json).unwrap_or_default();

    Ok(Edge {
        src_id: row.get("src_id")?,
        dst_id: row.get("dst_id")?,
        rel: EdgeRel::from(row.get::<_, String>("rel")?),
        properties,
        source: row.get("source")?,
        temporal: Bitemporal {
            valid_from: parse_datetime(&row.get::<_, String>("valid_from")?),
            valid_to: row.get::<_, Option<String>>("valid_to")?.map(|s| parse_datetime(&s)),
            tx_from: parse_datetime(&row.get::<_, String>("tx_from")?),
            tx_to: row.get::<_, Option<String>>("tx_to")?.map(|s| parse_datetime(&s)),
        },
    })
}

/// Inserts or updates an edge, applying close-and-reinsert discipline
/// keyed on `(src_id, dst_id, rel)`. Returns `true` if the store changed.
pub(crate) fn upsert_edge_on_conn(conn: &Connection, edge: &Edge, tx_time: DateTime<Utc>) -> Result<bool> {
    let new_hash = edge_content_hash(edge);

    let current: Option<String> = conn
        .query_row(
            "SELECT content_hash FROM edges WHERE src_id = ?1 AND dst_id = ?2 AND rel = ?3 AND tx_to IS NULL",
            params![edge.src_id, edge.dst_id, edge.rel.as_str()],
            |row| row.get(0),
        )
        .ok();

    if let Some(existing_hash) = current {
        if existing_hash == new_hash {
            return Ok(false);
        }
        conn.execute(
            "UPDATE edges SET tx_to = ?1 WHERE src_id = ?2 AND dst_id = ?3 AND rel = ?4 AND tx_to IS NULL",
            params![format_datetime(&tx_time), edge.src_id, edge.dst_id, edge.rel.as_str()],
        )?;
    }

    insert_edge_row(conn, edge, &new_hash, tx_time)?;
    Ok(true)
}

fn insert_edge_row(conn: &Connection, edge: &Edge, content_hash: &str, tx_time: DateTime<Utc>) -> Result<()> {
    if !edge.temporal.valid_range_ok() {
        return Err(StoreError::validation(format!(
            "edge {}->{} ({}) has valid_from > valid_to",
            edge.src_id,
            edge.dst_id,
            edge.rel.as_str()
        )));
    }
    conn.execute(
        "INSERT INTO edges (src_id, dst_id, rel, properties, source, content_hash, valid_from, valid_to, tx_from, tx_to)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)",
        params![
            edge.src_id,
            edge.dst_id,
            edge.rel.as_str(),
            serde_json::to_string(&edge.properties)?,
            edge.source,
            content_hash,
            format_datetime(&edge.temporal.valid_from),
            edge.temporal.valid_to.as_ref().map(format_datetime),
            format_datetime(&tx_time),
        ],
    )?;
    Ok(())
}

/// Returns current outgoing edges from `src_id`, optionally filtered by
/// relation.
pub(crate) fn get_edges_by_src_on_conn(conn: &Connection, src_id: &str, rel: Option<&str>) -> Result<Vec<Edge>> {
    let sql = match rel {
        Some(_) => format!("SELECT {EDGE_COLUMNS} FROM edges WHERE src_id = ?1 AND rel = ?2 AND tx_to IS NULL"),
        None => format!("SELECT {EDGE_COLUMNS} FROM edges WHERE src_id = ?1 AND tx_to IS NULL"),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = match rel {
        Some(r) => stmt.query_map(params![src_id, r], scan_edge)?,
        None => stmt.query_map(params![src_id], scan_edge)?,
    };
    rows.map(|r| r.map_err(StoreError::from)).collect()
}

/// Returns current incoming edges into `dst_id`, optionally filtered by
/// relation.
pub(crate) fn get_edges_by_dst_on_conn(conn: &Connection, dst_id: &str, rel: Option<&str>) -> Result<Vec<Edge>> {
    let sql = match rel {
        Some(_) => format!("SELECT {EDGE_COLUMNS} FROM edges WHERE dst_id = ?1 AND rel = ?2 AND tx_to IS NULL"),
        None => format!("SELECT {EDGE_COLUMNS} FROM edges WHERE dst_id = ?1 AND tx_to IS NULL"),
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = match rel {
        Some(r) => stmt.query_map(params![dst_id, r], scan_edge)?,
        None => stmt.query_map(params![dst_id], scan_edge)?,
    };
    rows.map(|r| r.map_err(StoreError::from)).collect()
}

impl SqliteStore {
    pub fn upsert_edge_impl(&self, edge: &Edge) -> Result<bool> {
        let conn = self.lock_conn()?;
        upsert_edge_on_conn(&conn, edge, Utc::now())
    }

    pub fn upsert_edges_impl(&self, edges: &[Edge]) -> Result<usize> {
        let conn = self.lock_conn()?;
        let now = Utc::now();
        let mut changed = 0;
        for edge in edges {
            if upsert_edge_on_conn(&conn, edge, now)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    pub fn get_edges_by_src_impl(&self, src_id: &str, rel: Option<&str>) -> Result<Vec<Edge>> {
        let conn = self.lock_conn()?;
        get_edges_by_src_on_conn(&conn, src_id, rel)
    }

    pub fn get_edges_by_dst_impl(&self, dst_id: &str, rel: Option<&str>) -> Result<Vec<Edge>> {
        let conn = self.lock_conn()?;
        get_edges_by_dst_on_conn(&conn, dst_id, rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::store::SqliteStore;
    use arc_model::edge::EdgeBuilder;
    use chrono::TimeZone;
    use serde_json::Value;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn insert_then_get_by_src() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        let edge = EdgeBuilder::new("commit:a", "file:x.rs", EdgeRel::Modifies, "vcs").build(ts(1), ts(1));
        assert!(upsert_edge_on_conn(&conn, &edge, ts(1)).unwrap());

        let out = get_edges_by_src_on_conn(&conn, "commit:a", None).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].dst_id, "file:x.rs");
    }

    #[test]
    fn reingest_identical_is_noop_and_property_change_reinserts() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        let a = EdgeBuilder::new("commit:a", "file:x", EdgeRel::Modifies, "vcs").build(ts(1), ts(1));
        assert!(upsert_edge_on_conn(&conn, &a, ts(1)).unwrap());
        assert!(!upsert_edge_on_conn(&conn, &a, ts(2)).unwrap());

        let b = EdgeBuilder::new("commit:a", "file:x", EdgeRel::Modifies, "vcs")
            .property("lines_changed", Value::from(3))
            .build(ts(3), ts(3));
        assert!(upsert_edge_on_conn(&conn, &b, ts(3)).unwrap());

        let current = get_edges_by_src_on_conn(&conn, "commit:a", Some("MODIFIES")).unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].properties.get("lines_changed"), Some(&Value::from(3)));
    }

    #[test]
    fn get_by_dst_filters_by_rel() {
        let store = SqliteStore::open_in_memory().unwrap();
        let conn = store.lock_conn().unwrap();
        upsert_edge_on_conn(&conn, &EdgeBuilder::new("pr:1", "issue:A", EdgeRel::Mentions, "remote").build(ts(1), ts(1)), ts(1)).unwrap();
        upsert_edge_on_conn(&conn, &EdgeBuilder::new("commit:a", "issue:A", EdgeRel::DependsOn, "vcs").build(ts(1), ts(1)), ts(1)).unwrap();

        let mentions = get_edges_by_dst_on_conn(&conn, "issue:A", Some("MENTIONS")).unwrap();
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].src_id, "pr:1");
    }
}
