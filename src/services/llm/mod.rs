//! Completion-service boundary
//!
//! The external text-generation capability this core calls but does not
//! implement. Concrete backends live in the embedding application.

pub mod provider;
pub mod types;

pub use provider::CompletionProvider;
pub use types::{
    LlmError, LlmRequestOptions, LlmResponse, LlmResult, Message, MessageRole, StopReason,
    ToolDefinition, UsageStats,
};
