//! Agent Records
//!
//! Per-agent lifecycle state: status, phase, plan, conversation, and the
//! final deliverable. The phase only increases, and the status moves only
//! along the lifecycle edges — both enforced here.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::utils::error::{ChorusError, ChorusResult};

use super::step::PlanStep;

/// Lifecycle status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    Queued,
    Planning,
    PlanReady,
    AwaitingClarification,
    AwaitingApproval,
    Running,
    Paused,
    Completed,
    Error,
}

impl AgentStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AgentStatus::Completed | AgentStatus::Error)
    }

    /// Whether the lifecycle state machine permits moving from `self` to `to`.
    pub fn can_transition(self, to: AgentStatus) -> bool {
        use AgentStatus::*;
        match (self, to) {
            (from, Error) => !from.is_terminal(),
            (Queued, Planning) => true,
            (Planning, PlanReady) => true,
            (PlanReady, AwaitingClarification) | (PlanReady, AwaitingApproval) => true,
            (AwaitingClarification, AwaitingApproval) => true,
            (AwaitingApproval, Running) => true,
            (Running, Paused) | (Paused, Running) => true,
            (Running, Completed) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentStatus::Queued => write!(f, "queued"),
            AgentStatus::Planning => write!(f, "planning"),
            AgentStatus::PlanReady => write!(f, "plan_ready"),
            AgentStatus::AwaitingClarification => write!(f, "awaiting_clarification"),
            AgentStatus::AwaitingApproval => write!(f, "awaiting_approval"),
            AgentStatus::Running => write!(f, "running"),
            AgentStatus::Paused => write!(f, "paused"),
            AgentStatus::Completed => write!(f, "completed"),
            AgentStatus::Error => write!(f, "error"),
        }
    }
}

/// Role of a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Assistant,
}

/// One entry in an agent's running conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationTurn {
    pub role: TurnRole,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::User,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: TurnRole::Assistant,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Final synthesized output of one agent's run, consumed by the orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deliverable {
    /// The executive takeaway text
    pub content: String,
    /// Bullet lines extracted from the content, used for cross-agent scans
    #[serde(default)]
    pub data_points: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Submission form for a new agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentSpec {
    /// Short display name used in insights and cross-agent synthesis
    pub name: String,
    /// What the agent should accomplish
    pub objective: String,
    /// Additional context for planning and execution
    #[serde(default)]
    pub description: String,
    /// Names of tools available to the agent
    #[serde(default)]
    pub tool_names: Vec<String>,
    /// MCP endpoints available to the agent
    #[serde(default)]
    pub mcp_endpoints: Vec<String>,
    /// Ask 2-3 clarifying questions before approval
    #[serde(default)]
    pub clarify: bool,
}

impl AgentSpec {
    pub fn new(name: impl Into<String>, objective: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            objective: objective.into(),
            description: String::new(),
            tool_names: Vec::new(),
            mcp_endpoints: Vec::new(),
            clarify: false,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_tools(mut self, tool_names: Vec<String>) -> Self {
        self.tool_names = tool_names;
        self
    }

    pub fn with_clarification(mut self) -> Self {
        self.clarify = true;
        self
    }
}

/// Full record of one agent's lifecycle state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentRecord {
    pub id: String,
    pub name: String,
    pub objective: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tool_names: Vec<String>,
    #[serde(default)]
    pub mcp_endpoints: Vec<String>,
    pub status: AgentStatus,
    /// Lifecycle phase 0-4. Only ever increases.
    pub current_phase: u8,
    #[serde(default)]
    pub plan: Vec<PlanStep>,
    #[serde(default)]
    pub clarifying_questions: Vec<String>,
    #[serde(default)]
    pub clarifying_answers: HashMap<String, String>,
    #[serde(default)]
    pub conversation: Vec<ConversationTurn>,
    #[serde(default)]
    pub holistic_insights: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deliverable: Option<Deliverable>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AgentRecord {
    /// Create a queued record from a submission.
    pub fn new(spec: AgentSpec) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: spec.name,
            objective: spec.objective,
            description: spec.description,
            tool_names: spec.tool_names,
            mcp_endpoints: spec.mcp_endpoints,
            status: AgentStatus::Queued,
            current_phase: 0,
            plan: Vec::new(),
            clarifying_questions: Vec::new(),
            clarifying_answers: HashMap::new(),
            conversation: Vec::new(),
            holistic_insights: Vec::new(),
            deliverable: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance the lifecycle phase. The phase is monotonic: regressions are
    /// ignored.
    pub fn set_phase(&mut self, phase: u8) {
        if phase > self.current_phase {
            self.current_phase = phase.min(4);
            self.touch();
        }
    }

    /// Move to `status` along a permitted lifecycle edge.
    pub fn transition_to(&mut self, status: AgentStatus) -> ChorusResult<()> {
        if !self.status.can_transition(status) {
            return Err(ChorusError::validation(format!(
                "invalid status transition {} -> {}",
                self.status, status
            )));
        }
        self.status = status;
        self.touch();
        Ok(())
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
