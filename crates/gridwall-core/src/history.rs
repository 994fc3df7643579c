//! The history log: an append-only record of every accepted mutation.
//!
//! # Design
//!
//! - **Append-only**: entries are never modified or deleted.
//! - **Ordered**: insertion order is acceptance order.
//! - **No dedup**: writing the same value twice produces two entries.
//!
//! Together with [`Grid`](crate::grid::Grid) it satisfies: the value of
//! cell `i` equals the value of the last entry for `i`, or blank if there
//! is none.

use std::collections::HashMap;

use gridwall_types::{HistoryEntry, SecondBucket};

use crate::clock::second_of;

/// Append-only log of accepted submissions.
#[derive(Debug, Default, Clone)]
pub struct HistoryLog {
    /// All entries, in insertion order.
    entries: Vec<HistoryEntry>,
}

impl HistoryLog {
    /// Create a new empty log.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Return the number of entries in the log.
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Return whether the log has no entries.
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append an entry to the end of the log.
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push(entry);
    }

    /// Every entry in acceptance order.
    pub fn read_all(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Bucket entries by `floor(timestamp / 1000)`.
    ///
    /// Buckets appear in the order their first entry was accepted;
    /// entries keep log order inside each bucket.
    pub fn group_by_second(&self) -> Vec<SecondBucket> {
        let mut buckets: Vec<SecondBucket> = Vec::new();
        let mut position: HashMap<i64, usize> = HashMap::new();

        for entry in &self.entries {
            let second = second_of(entry.timestamp);
            if let Some(bucket) = position.get(&second).and_then(|&i| buckets.get_mut(i)) {
                bucket.entries.push(entry.clone());
            } else {
                position.insert(second, buckets.len());
                buckets.push(SecondBucket {
                    second,
                    entries: vec![entry.clone()],
                });
            }
        }

        buckets
    }
}
