//! Orchestrator Snapshot
//!
//! Cross-agent aggregation state. One instance per engagement, mutated only
//! by the orchestrator's synthesis routine.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::agent::Deliverable;

/// State of the cross-agent synthesis pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisStatus {
    #[default]
    Idle,
    Synthesizing,
    Completed,
    Error,
}

impl std::fmt::Display for SynthesisStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SynthesisStatus::Idle => write!(f, "idle"),
            SynthesisStatus::Synthesizing => write!(f, "synthesizing"),
            SynthesisStatus::Completed => write!(f, "completed"),
            SynthesisStatus::Error => write!(f, "error"),
        }
    }
}

/// A deliverable as received from one agent. Last write per agent wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedDeliverable {
    pub agent_name: String,
    pub deliverable: Deliverable,
    pub received_at: DateTime<Utc>,
}

/// Aggregated cross-agent synthesis state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrchestratorSnapshot {
    /// Deliverables keyed by agent id
    #[serde(default)]
    pub deliverables: HashMap<String, ReceivedDeliverable>,
    #[serde(default)]
    pub synthesis_status: SynthesisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub executive_summary: Option<String>,
    #[serde(default)]
    pub contradictions: Vec<String>,
    #[serde(default)]
    pub key_findings: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_synthesis_at: Option<DateTime<Utc>>,
}
