//! Saved-version history per document.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

/// One saved version of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryVersion {
    pub content: String,
    pub saved_at: DateTime<Utc>,
}

/// Bounded list of saved versions, oldest first
#[derive(Debug, Clone)]
pub struct DocumentHistory {
    versions: VecDeque<HistoryVersion>,
    limit: usize,
}

impl DocumentHistory {
    pub fn new(limit: usize) -> Self {
        Self {
            versions: VecDeque::new(),
            limit: limit.max(1),
        }
    }

    /// Append a version, dropping the oldest beyond the limit
    pub fn record(&mut self, content: &str) {
        if self.versions.back().map(|v| v.content.as_str()) == Some(content) {
            return;
        }
        self.versions.push_back(HistoryVersion {
            content: content.to_string(),
            saved_at: Utc::now(),
        });
        while self.versions.len() > self.limit {
            self.versions.pop_front();
        }
    }

    pub fn get(&self, index: usize) -> Option<&HistoryVersion> {
        self.versions.get(index)
    }

    pub fn latest(&self) -> Option<&HistoryVersion> {
        self.versions.back()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryVersion> {
        self.versions.iter()
    }
}
