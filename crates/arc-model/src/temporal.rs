//! Bi-temporal fields shared by every node and edge row.
//!
//! Every row carries two independent time axes: valid time (when the
//! fact was true in the world) and transaction time (when the store
//! learned about it). Both are append-only: an update never mutates a
//! row in place, it closes the current row's `tx_to` and inserts a new
//! row with an open `tx_to`. See [`Bitemporal::close_and_reinsert`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The four bi-temporal timestamps carried by a node or edge row.
///
/// `valid_to: None` means the fact is still true; `tx_to: None` means
/// this is the current row as far as the store's transaction log is
/// concerned. A row with `tx_to.is_some()` is a closed historical
/// version and must never be the target of a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bitemporal {
    pub valid_from: DateTime<Utc>,
    pub valid_to: Option<DateTime<Utc>>,
    pub tx_from: DateTime<Utc>,
    pub tx_to: Option<DateTime<Utc>>,
}

impl Bitemporal {
    /// Opens a new current row: valid from `valid_from` (open-ended),
    /// recorded by the transaction starting at `tx_from`.
    pub fn open(valid_from: DateTime<Utc>, tx_from: DateTime<Utc>) -> Self {
        Self {
            valid_from,
            valid_to: None,
            tx_from,
            tx_to: None,
        }
    }

    /// `true` if this row is the current one (`tx_to` unset).
    pub fn is_current(&self) -> bool {
        self.tx_to.is_none()
    }

    /// `true` if `valid_from <= valid_to` (or `valid_to` is open), the
    /// invariant every row must satisfy.
    pub fn valid_range_ok(&self) -> bool {
        match self.valid_to {
            Some(to) => self.valid_from <= to,
            None => true,
        }
    }

    /// Returns a copy of `self` closed at `tx_time`, to be written over
    /// the existing row in place of a mutation.
    ///
    /// `tx_time` must be `>= self.tx_from` to preserve monotonic
    /// `tx_from` ordering across a row's history; callers that violate
    /// this get a closed row with a `tx_to < tx_from`, which the store
    /// layer's invariant checks reject before commit.
    pub fn close_at(&self, tx_time: DateTime<Utc>) -> Self {
        Self {
            tx_to: Some(tx_time),
            ..*self
        }
    }

    /// Builds the replacement row for a close-and-reinsert update: the
    /// prior row closed at `tx_time`, and a new current row open from
    /// `new_valid_from` as of the same transaction.
    pub fn close_and_reinsert(&self, tx_time: DateTime<Utc>, new_valid_from: DateTime<Utc>) -> (Self, Self) {
        let closed = self.close_at(tx_time);
        let reopened = Self::open(new_valid_from, tx_time);
        (closed, reopened)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn open_row_is_current_and_valid() {
        let row = Bitemporal::open(ts(100), ts(100));
        assert!(row.is_current());
        assert!(row.valid_range_ok());
    }

    #[test]
    fn close_and_reinsert_never_mutates_in_place() {
        let row = Bitemporal::open(ts(100), ts(100));
        let (closed, reopened) = row.close_and_reinsert(ts(200), ts(200));
        assert_eq!(closed.tx_to, Some(ts(200)));
        assert!(!closed.is_current());
        assert!(reopened.is_current());
        assert_eq!(reopened.valid_from, ts(200));
        assert_eq!(reopened.tx_from, ts(200));
    }

    #[test]
    fn invalid_range_detected() {
        let mut row = Bitemporal::open(ts(200), ts(100));
        row.valid_to = Some(ts(100));
        assert!(!row.valid_range_ok());
    }
}
