//! Insight Entries
//!
//! A single reported finding, deduplicated across all agents. Entries are
//! created only through the ledger's accept path and are immutable once
//! stored, except for external deletion.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One accepted finding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightEntry {
    pub id: String,
    pub agent_id: String,
    pub agent_name: String,
    pub text: String,
    /// Title of the step the finding came from, when step-scoped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_title: Option<String>,
    /// Lifecycle phase the agent was in when reporting
    pub phase: u8,
    /// Global accept order across all agents
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub reported_at: DateTime<Utc>,
}

/// Context attached to a batch of candidate findings.
#[derive(Debug, Clone, Default)]
pub struct InsightMetadata {
    pub step_title: Option<String>,
    pub phase: u8,
}

impl InsightMetadata {
    pub fn for_phase(phase: u8) -> Self {
        Self {
            step_title: None,
            phase,
        }
    }

    pub fn with_step_title(mut self, title: impl Into<String>) -> Self {
        self.step_title = Some(title.into());
        self
    }
}
