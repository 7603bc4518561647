use anyhow::Result;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::validator::category::Category;
use crate::validator::report::ValidationResult;

/// Frozen snapshot of one completed run. Never mutated after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub timestamp: String,
    pub master_file: String,
    pub source_file: String,
    pub category: Category,
    pub result: ValidationResult,
}

impl HistoryEntry {
    pub fn new(
        master_file: String,
        source_file: String,
        category: Category,
        result: ValidationResult,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            timestamp: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            master_file,
            source_file,
            category,
            result,
        }
    }
}

/// Append-only, reverse-chronological run history. The engine only ever
/// appends; a capacity (a storage concern, invisible to callers of the
/// engine) prunes whole entries from the old end.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct HistoryLog {
    entries: VecDeque<HistoryEntry>,
    #[serde(skip)]
    capacity: Option<usize>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
        }
    }

    /// Newest entries go to the front; the oldest fall off past capacity.
    pub fn append(&mut self, entry: HistoryEntry) {
        self.entries.push_front(entry);
        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                self.entries.pop_back();
            }
        }
    }

    /// Entries newest first.
    pub fn list(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.front()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// JSON-file persistence for the history log. Owns the path and the size
/// cap; the validation engine itself stays storage-agnostic.
pub struct HistoryStore {
    path: PathBuf,
    capacity: Option<usize>,
}

impl HistoryStore {
    pub fn new(path: &Path, capacity: Option<usize>) -> Self {
        Self {
            path: path.to_path_buf(),
            capacity,
        }
    }

    /// A missing file is an empty history, not an error.
    pub fn load(&self) -> Result<HistoryLog> {
        if !self.path.exists() {
            return Ok(HistoryLog::with_capacity(self.capacity));
        }
        let content = std::fs::read_to_string(&self.path)?;
        let mut log: HistoryLog = serde_json::from_str(&content)?;
        log.capacity = self.capacity;
        if let Some(capacity) = self.capacity {
            while log.entries.len() > capacity {
                log.entries.pop_back();
            }
        }
        Ok(log)
    }

    pub fn save(&self, log: &HistoryLog) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content = serde_json::to_string_pretty(log)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}
