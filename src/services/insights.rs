//! Insight Ledger
//!
//! Append-only collection of findings reported by agents, deduplicated
//! across all of them. The reject-or-append decision is made and applied
//! under a single lock acquisition with no suspension point, so two
//! near-simultaneous submissions of the same fact cannot both pass the
//! duplicate check.

use std::sync::{Mutex, PoisonError};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use crate::models::insight::{InsightEntry, InsightMetadata};

use super::similarity::similar;

/// Similarity at or above this rejects a candidate as a near-duplicate.
pub const SIMILARITY_THRESHOLD: f32 = 0.7;

#[derive(Default)]
struct LedgerInner {
    entries: Vec<InsightEntry>,
    next_sequence: u64,
}

/// Shared, cross-agent finding registry.
#[derive(Default)]
pub struct InsightLedger {
    inner: Mutex<LedgerInner>,
}

impl InsightLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Submit candidate findings. Each candidate is compared against the full
    /// accumulated history (including candidates accepted earlier in the same
    /// call); near-duplicates are silently dropped. Returns the accepted
    /// entries.
    pub fn submit(
        &self,
        agent_id: &str,
        agent_name: &str,
        candidates: &[String],
        meta: InsightMetadata,
    ) -> Vec<InsightEntry> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Utc::now();
        let mut accepted = Vec::new();

        for candidate in candidates {
            let text = candidate.trim();
            if text.is_empty() {
                continue;
            }

            let duplicate = inner
                .entries
                .iter()
                .any(|entry| similar(&entry.text, text) >= SIMILARITY_THRESHOLD);
            if duplicate {
                debug!(agent = %agent_id, "dropping near-duplicate insight: {text}");
                continue;
            }

            inner.next_sequence += 1;
            let entry = InsightEntry {
                id: Uuid::new_v4().to_string(),
                agent_id: agent_id.to_string(),
                agent_name: agent_name.to_string(),
                text: text.to_string(),
                step_title: meta.step_title.clone(),
                phase: meta.phase,
                sequence: inner.next_sequence,
                timestamp: now,
                reported_at: now,
            };
            inner.entries.push(entry.clone());
            accepted.push(entry);
        }

        accepted
    }

    /// All entries, newest first.
    pub fn list_all(&self) -> Vec<InsightEntry> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries = inner.entries.clone();
        entries.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then(b.sequence.cmp(&a.sequence))
        });
        entries
    }

    /// Remove an entry by id. Has no effect on other entries.
    pub fn delete(&self, id: &str) -> bool {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let before = inner.entries.len();
        inner.entries.retain(|entry| entry.id != id);
        inner.entries.len() != before
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
