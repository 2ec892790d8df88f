use std::collections::VecDeque;
use std::time::SystemTime;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Path,
    Value,
}

impl std::fmt::Display for HistoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Path => write!(f, "path"),
            Self::Value => write!(f, "value"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub kind: HistoryKind,
    pub value: String,
    pub timestamp: SystemTime,
}

/// Bounded log of jump targets, oldest first.
#[derive(Debug, Clone)]
pub struct HistoryLedger {
    entries: VecDeque<HistoryEntry>,
    max: usize,
}

impl Default for HistoryLedger {
    fn default() -> Self {
        Self::new(100)
    }
}

impl HistoryLedger {
    #[must_use]
    pub fn new(max: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max.min(1024)),
            max,
        }
    }

    /// Record a jump target.
    ///
    /// Returns `false` when it repeats the most recent entry, which is then
    /// left untouched.
    pub fn add(&mut self, kind: HistoryKind, value: impl Into<String>) -> bool {
        let value = value.into();
        if self
            .entries
            .back()
            .is_some_and(|last| last.kind == kind && last.value == value)
        {
            return false;
        }
        self.entries.push_back(HistoryEntry {
            kind,
            value,
            timestamp: SystemTime::now(),
        });
        while self.entries.len() > self.max {
            self.entries.pop_front();
        }
        true
    }

    #[must_use]
    pub fn max(&self) -> usize {
        self.max
    }

    pub fn entries(&self) -> impl DoubleEndedIterator<Item = &HistoryEntry> + ExactSizeIterator {
        self.entries.iter()
    }

    #[must_use]
    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
