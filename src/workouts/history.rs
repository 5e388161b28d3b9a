//! Undo history for the edit engine.
//!
//! Each entry is a full copy of the workout taken just before an edit, so
//! undo is a swap rather than a replay.

use std::collections::VecDeque;

use crate::workouts::types::Workout;

/// Maximum snapshots kept before the oldest is dropped.
pub const MAX_HISTORY_SIZE: usize = 50;

/// A pre-edit snapshot.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    /// What the edit did, e.g. "Scale x1.10"
    pub label: String,
    pub snapshot: Workout,
}

/// Bounded stack of workout snapshots.
#[derive(Debug, Clone)]
pub struct EditHistory {
    entries: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl Default for EditHistory {
    fn default() -> Self {
        Self::with_capacity(MAX_HISTORY_SIZE)
    }
}

impl EditHistory {
    /// Create a history holding at most `capacity` snapshots.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a snapshot, dropping the oldest one when full.
    pub fn push(&mut self, label: impl Into<String>, snapshot: Workout) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(HistoryEntry {
            label: label.into(),
            snapshot,
        });
    }

    /// Take the most recent snapshot.
    pub fn pop(&mut self) -> Option<HistoryEntry> {
        self.entries.pop_back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Label of the edit the next undo would revert.
    pub fn latest_label(&self) -> Option<&str> {
        self.entries.back().map(|entry| entry.label.as_str())
    }

    /// Entries from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }
}
