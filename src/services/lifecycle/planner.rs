//! Plan Generation
//!
//! Phase 1: one completion call turns the agent's objective into 5-8
//! actionable steps, parsed from a numbered response. Formatting slips fall
//! back to bullet or plain-line extraction rather than failing the phase.

use crate::models::agent::AgentRecord;
use crate::models::step::PlanStep;
use crate::services::llm::{CompletionProvider, LlmRequestOptions, Message};
use crate::utils::error::{ChorusError, ChorusResult};

use super::parse::parse_list_lines;
use super::LifecycleConfig;

pub(crate) const PLANNING_SYSTEM: &str = "You are a planning assistant for an autonomous agent. \
    Decompose the objective into a numbered list of 5-8 actionable steps. \
    Respond with the numbered list only, one step per line.";

/// Generate the task plan for an agent.
pub async fn generate_plan(
    record: &AgentRecord,
    config: &LifecycleConfig,
    provider: &dyn CompletionProvider,
) -> ChorusResult<Vec<PlanStep>> {
    let mut prompt = format!("## Objective\n{}\n", record.objective);
    if !record.description.is_empty() {
        prompt.push_str(&format!("\n## Context\n{}\n", record.description));
    }
    if !record.tool_names.is_empty() {
        prompt.push_str(&format!(
            "\n## Available Tools\n{}\n",
            record.tool_names.join(", ")
        ));
    }
    if !record.mcp_endpoints.is_empty() {
        prompt.push_str(&format!(
            "\n## MCP Endpoints\n{}\n",
            record.mcp_endpoints.join(", ")
        ));
    }
    prompt.push_str("\nProduce the execution plan.");

    let messages = vec![Message::user(prompt)];
    let options = LlmRequestOptions {
        temperature_override: Some(0.3),
        ..Default::default()
    };

    let response = provider
        .send_message(messages, Some(PLANNING_SYSTEM.to_string()), vec![], options)
        .await
        .map_err(|e| ChorusError::completion(format!("plan generation failed: {e}")))?;

    let text = response.content.unwrap_or_default();
    let titles = parse_list_lines(&text);
    if titles.is_empty() {
        return Err(ChorusError::parse("plan response contained no steps"));
    }

    Ok(titles
        .into_iter()
        .take(config.max_plan_steps)
        .enumerate()
        .map(|(index, title)| PlanStep::new(index, title))
        .collect())
}
