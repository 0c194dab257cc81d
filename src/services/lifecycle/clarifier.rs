//! Clarifying Questions
//!
//! Phase 2 support: one completion call produces 2-3 clarifying questions.
//! A provider error still aborts the phase, but a formatting slip only skips
//! the questions — approval is a UX nicety, not a correctness gate.

use tracing::warn;

use crate::models::agent::AgentRecord;
use crate::services::llm::{CompletionProvider, LlmRequestOptions, Message};
use crate::utils::error::{ChorusError, ChorusResult};

use super::parse::{parse_bullet_lines, parse_numbered_lines};

/// Hard cap on the number of clarifying questions.
const MAX_CLARIFYING_QUESTIONS: usize = 3;

pub(crate) const CLARIFYING_SYSTEM: &str = "You are preparing to execute a task plan. \
    Ask 2-3 short clarifying questions that would most improve the result. \
    Respond with a numbered list of questions only.";

/// Generate clarifying questions for the agent's plan. Returns an empty list
/// when the response does not parse.
pub async fn generate_questions(
    record: &AgentRecord,
    provider: &dyn CompletionProvider,
) -> ChorusResult<Vec<String>> {
    let plan_lines = record
        .plan
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step.title))
        .collect::<Vec<_>>()
        .join("\n");

    let prompt = format!(
        "## Objective\n{}\n\n## Planned Steps\n{}\n\nWhat should be clarified before execution?",
        record.objective, plan_lines
    );

    let messages = vec![Message::user(prompt)];
    let response = provider
        .send_message(
            messages,
            Some(CLARIFYING_SYSTEM.to_string()),
            vec![],
            LlmRequestOptions::default(),
        )
        .await
        .map_err(|e| ChorusError::completion(format!("clarifying question generation failed: {e}")))?;

    let text = response.content.unwrap_or_default();
    let mut questions = parse_numbered_lines(&text);
    if questions.is_empty() {
        questions = parse_bullet_lines(&text);
    }
    if questions.is_empty() && !text.trim().is_empty() {
        warn!(agent = %record.id, "clarifying question response did not parse; continuing without questions");
    }
    questions.truncate(MAX_CLARIFYING_QUESTIONS);
    Ok(questions)
}
