//! Task Plan Steps
//!
//! A plan is an ordered list of steps belonging to one agent, mutated only
//! by that agent's execution loop, strictly in plan order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Execution status of a single plan step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    /// Waiting to be executed
    Pending,
    /// Currently running
    Running,
    /// Completed successfully
    Completed,
    /// Failed
    Failed,
}

impl StepStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, StepStatus::Completed | StepStatus::Failed)
    }
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Running => write!(f, "running"),
            StepStatus::Completed => write!(f, "completed"),
            StepStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A single step in an agent's task plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanStep {
    /// Unique step identifier (e.g., "step-1")
    pub id: String,
    /// Step title
    pub title: String,
    /// Current status
    pub status: StepStatus,
    /// Completion percentage, 0-100
    pub progress: u8,
    /// When execution began
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    /// When execution reached a terminal status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Output produced by the step
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_text: Option<String>,
    /// Artifacts produced (fenced blocks, file paths, URLs)
    #[serde(default)]
    pub artifacts: Vec<String>,
}

impl PlanStep {
    /// Create a pending step at the given plan position (0-based).
    pub fn new(index: usize, title: impl Into<String>) -> Self {
        Self {
            id: format!("step-{}", index + 1),
            title: title.into(),
            status: StepStatus::Pending,
            progress: 0,
            started_at: None,
            completed_at: None,
            output_text: None,
            artifacts: Vec::new(),
        }
    }

    /// Mark the step as running. Steps must pass through `Running` before
    /// reaching a terminal status.
    pub fn mark_running(&mut self) {
        self.status = StepStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Mark the step as completed with its output and artifacts.
    pub fn mark_completed(&mut self, output: String, artifacts: Vec<String>) {
        debug_assert_eq!(self.status, StepStatus::Running);
        self.status = StepStatus::Completed;
        self.progress = 100;
        self.completed_at = Some(Utc::now());
        self.output_text = Some(output);
        self.artifacts = artifacts;
    }

    /// Mark the step as failed.
    pub fn mark_failed(&mut self) {
        debug_assert_eq!(self.status, StepStatus::Running);
        self.status = StepStatus::Failed;
        self.completed_at = Some(Utc::now());
    }
}
