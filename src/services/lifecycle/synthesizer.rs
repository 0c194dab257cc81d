//! Deliverable Synthesis
//!
//! Phase 4: one completion call over the full conversation history produces
//! the agent's executive takeaway, stored as its deliverable.

use chrono::Utc;

use crate::models::agent::{AgentRecord, Deliverable};
use crate::services::llm::{CompletionProvider, LlmRequestOptions, Message};
use crate::utils::error::{ChorusError, ChorusResult};

use super::executor::turn_to_message;
use super::parse::parse_list_lines;

pub(crate) const SYNTHESIS_SYSTEM: &str = "You summarize a completed agent run into an executive takeaway. \
    Respond with 5-8 bullet points covering the most important results and conclusions.";

/// Synthesize the agent's deliverable from its conversation history.
pub async fn synthesize_deliverable(
    record: &AgentRecord,
    provider: &dyn CompletionProvider,
) -> ChorusResult<Deliverable> {
    let mut messages: Vec<Message> = record.conversation.iter().map(turn_to_message).collect();
    messages.push(Message::user(
        "Produce the executive takeaway for the work above.",
    ));

    let response = provider
        .send_message(
            messages,
            Some(SYNTHESIS_SYSTEM.to_string()),
            vec![],
            LlmRequestOptions::default(),
        )
        .await
        .map_err(|e| ChorusError::completion(format!("deliverable synthesis failed: {e}")))?;

    let content = response.content.unwrap_or_default();
    if content.trim().is_empty() {
        return Err(ChorusError::parse("deliverable synthesis returned no content"));
    }

    let data_points = parse_list_lines(&content);
    Ok(Deliverable {
        content,
        data_points,
        created_at: Utc::now(),
    })
}
