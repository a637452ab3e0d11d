//! Deduplicating merge buffer for console records.
//!
//! This module provides the ordered console log with:
//! - First-occurrence-wins deduplication by idempotency key
//! - Arrival order preserved for everything that survives
//! - A single pass per merge (seen-key set instead of a rescan)
//!
//! Records reach the log from two places: the live stream, one record at a
//! time through [`LogSequence::merge`], and the historical buffer, one batch
//! through [`LogSequence::merge_history`]. History is placed ahead of what
//! the stream already delivered, so both arrival orders end in the same
//! sequence.

use std::collections::{HashMap, HashSet};

use livelog_types::{IdempotencyKey, LogRecord};

/// Ordered console log with no duplicate idempotency keys.
#[derive(Debug, Clone, Default)]
pub struct LogSequence {
    records: Vec<LogRecord>,
    seen: HashSet<IdempotencyKey>,
}

impl LogSequence {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a log from records, dropping later duplicates.
    pub fn from_records(records: impl IntoIterator<Item = LogRecord>) -> Self {
        let mut log = Self::new();
        log.merge(records);
        log
    }

    /// Append records, keeping only the first occurrence of each key.
    ///
    /// Returns the number of records added.
    pub fn merge(&mut self, incoming: impl IntoIterator<Item = LogRecord>) -> usize {
        let before = self.records.len();
        for record in incoming {
            if self.seen.insert(record.idempotency_key.clone()) {
                self.records.push(record);
            }
        }
        self.records.len() - before
    }

    /// Merge a historical batch in front of the current contents.
    ///
    /// Positions follow `merge(batch, current)`, but a key that is already
    /// present keeps the record stored first. Returns the number of records
    /// that were not already present.
    pub fn merge_history(&mut self, batch: impl IntoIterator<Item = LogRecord>) -> usize {
        let before = self.records.len();
        let mut stored: Vec<Option<LogRecord>> = std::mem::take(&mut self.records)
            .into_iter()
            .map(Some)
            .collect();
        let index: HashMap<IdempotencyKey, usize> = stored
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (r.idempotency_key.clone(), i)))
            .collect();

        let mut merged = Self::new();
        for record in batch {
            let existing = index
                .get(&record.idempotency_key)
                .and_then(|&i| stored[i].take());
            merged.merge(Some(existing.unwrap_or(record)));
        }
        merged.merge(stored.into_iter().flatten());

        *self = merged;
        self.records.len() - before
    }

    /// Check whether a key has already been merged.
    pub fn contains(&self, key: &IdempotencyKey) -> bool {
        self.seen.contains(key)
    }

    /// The records in log order.
    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Iterate over the records in log order.
    pub fn iter(&self) -> std::slice::Iter<'_, LogRecord> {
        self.records.iter()
    }

    /// Idempotency keys in log order.
    pub fn keys(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.idempotency_key.as_str())
            .collect()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the log is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.seen.clear();
    }
}

impl PartialEq for LogSequence {
    fn eq(&self, other: &Self) -> bool {
        self.records == other.records
    }
}

impl Eq for LogSequence {}

impl<'a> IntoIterator for &'a LogSequence {
    type Item = &'a LogRecord;
    type IntoIter = std::slice::Iter<'a, LogRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.iter()
    }
}

/// `current` followed by `incoming`, keeping the earliest occurrence of
/// every idempotency key.
pub fn merge(current: &LogSequence, incoming: impl IntoIterator<Item = LogRecord>) -> LogSequence {
    let mut merged = current.clone();
    merged.merge(incoming);
    merged
}
