//! Agent Chorus
//!
//! Orchestration core that coordinates many independent long-running agents
//! through a fixed four-phase lifecycle (plan -> clarify/approve -> execute ->
//! synthesize), aggregates their deliverables into a cross-agent summary, and
//! filters duplicate findings.
//!
//! This is a library invoked by an embedding transport layer. Persistence,
//! transports, rendering, and the completion service itself are external
//! collaborators reached through the trait seams in `services`.
//!
//! ## Module Organization
//!
//! - `models` - data model (agent records, plan steps, insights, snapshot)
//! - `services::lifecycle` - per-agent four-phase state machine
//! - `services::orchestrator` - fan-in aggregation and two-step synthesis
//! - `services::insights` / `services::similarity` - deduplicating ledger
//! - `services::llm` - completion-service boundary
//! - `services::events` / `services::store` - collaborator seams
//! - `services::gate` - await-with-deadline primitive for approval waits
//!
//! ## Concurrency Model
//!
//! Single-process cooperative scheduling: many agents each await I/O at
//! different times. Shared registries (ledger, snapshot) mutate under a
//! single lock acquisition with no suspension point in the middle.

pub mod models;
pub mod services;
pub mod utils;

// ── Error Types ────────────────────────────────────────────────────────
pub use utils::error::{ChorusError, ChorusResult};

// ── Data Model ─────────────────────────────────────────────────────────
pub use models::agent::{
    AgentRecord, AgentSpec, AgentStatus, ConversationTurn, Deliverable, TurnRole,
};
pub use models::insight::{InsightEntry, InsightMetadata};
pub use models::orchestrator::{OrchestratorSnapshot, ReceivedDeliverable, SynthesisStatus};
pub use models::step::{PlanStep, StepStatus};

// ── Lifecycle ──────────────────────────────────────────────────────────
pub use services::lifecycle::{AgentController, LifecycleConfig};

// ── Orchestration ──────────────────────────────────────────────────────
pub use services::orchestrator::{Orchestrator, OrchestratorConfig};

// ── Insights ───────────────────────────────────────────────────────────
pub use services::insights::{InsightLedger, SIMILARITY_THRESHOLD};
pub use services::similarity::similar;

// ── Collaborator Seams ─────────────────────────────────────────────────
pub use services::events::{ChannelSink, ChorusEvent, EventSink, NullSink};
pub use services::gate::ApprovalGate;
pub use services::llm::{
    CompletionProvider, LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageRole,
    StopReason, ToolDefinition, UsageStats,
};
pub use services::store::{AgentStateStore, JsonFileStore, MemoryStateStore};
