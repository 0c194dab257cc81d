//! Step Execution
//!
//! Phase 3: strict in-order execution of the task plan. Step i+1 never
//! starts before step i reaches a terminal status; a stop request is honored
//! only between steps; a failed step re-raises and halts the run.

use std::collections::BTreeMap;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::models::agent::{AgentRecord, ConversationTurn};
use crate::services::events::{ChorusEvent, EventSink};
use crate::services::llm::{CompletionProvider, LlmRequestOptions, Message, MessageRole};
use crate::services::store::AgentStateStore;
use crate::utils::error::{ChorusError, ChorusResult};

use super::parse::{
    extract_fenced_blocks, keyword_finding_lines, parse_bullet_lines, parse_numbered_lines,
};
use super::LifecycleConfig;

pub(crate) const HOLISTIC_SYSTEM: &str = "You review the full output of a completed task plan. \
    Report 6-10 cross-cutting findings that hold across the steps, as a numbered list, \
    one finding per line.";

/// How the execution loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// Every step reached `Completed`
    Completed,
    /// A stop request ended the loop between steps
    Stopped,
}

/// Execute the agent's plan in order.
pub async fn execute_plan(
    record: &RwLock<AgentRecord>,
    provider: &dyn CompletionProvider,
    store: &dyn AgentStateStore,
    events: &dyn EventSink,
    stop: &CancellationToken,
) -> ChorusResult<ExecutionOutcome> {
    let total = record.read().await.plan.len();

    for index in 0..total {
        if stop.is_cancelled() {
            return Ok(ExecutionOutcome::Stopped);
        }

        // Mark running and build the step prompt under one lock acquisition;
        // the provider call happens with no lock held.
        let (agent_id, step_id, step_title, system, prompt, messages) = {
            let mut rec = record.write().await;
            rec.plan[index].mark_running();
            rec.touch();

            let step = &rec.plan[index];
            let prompt = build_step_prompt(&rec, index, total);
            let mut messages: Vec<Message> =
                rec.conversation.iter().map(turn_to_message).collect();
            messages.push(Message::user(prompt.clone()));

            (
                rec.id.clone(),
                step.id.clone(),
                step.title.clone(),
                build_execution_system(&rec),
                prompt,
                messages,
            )
        };

        events.emit(ChorusEvent::StepStarted {
            agent_id: agent_id.clone(),
            step_id: step_id.clone(),
        });

        let result = provider
            .send_message(messages, Some(system), vec![], LlmRequestOptions::default())
            .await;

        match result {
            Ok(response) => {
                let output = response.content.unwrap_or_default();
                let artifacts = extract_fenced_blocks(&output);
                {
                    let mut rec = record.write().await;
                    rec.plan[index].mark_completed(output.clone(), artifacts);
                    rec.conversation.push(ConversationTurn::user(prompt));
                    rec.conversation.push(ConversationTurn::assistant(output));
                    rec.touch();
                }
                events.emit(ChorusEvent::StepCompleted {
                    agent_id: agent_id.clone(),
                    step_id,
                });
                save_state(record, store).await;
            }
            Err(e) => {
                {
                    let mut rec = record.write().await;
                    rec.plan[index].mark_failed();
                    rec.touch();
                }
                events.emit(ChorusEvent::StepFailed {
                    agent_id,
                    step_id,
                    error: e.to_string(),
                });
                save_state(record, store).await;
                return Err(ChorusError::completion(format!(
                    "step '{step_title}' failed: {e}"
                )));
            }
        }
    }

    Ok(ExecutionOutcome::Completed)
}

/// Produce cross-cutting findings over all completed step outputs. One
/// synthesis call over everything together, not one per step.
pub async fn holistic_insights(
    record: &AgentRecord,
    config: &LifecycleConfig,
    provider: &dyn CompletionProvider,
) -> ChorusResult<Vec<String>> {
    let mut prompt = format!("## Objective\n{}\n\n## Step Outputs\n", record.objective);
    for step in &record.plan {
        if let Some(output) = &step.output_text {
            prompt.push_str(&format!("### {}\n{}\n\n", step.title, output));
        }
    }
    prompt.push_str("Report the cross-cutting findings.");

    let messages = vec![Message::user(prompt)];
    let response = provider
        .send_message(
            messages,
            Some(HOLISTIC_SYSTEM.to_string()),
            vec![],
            LlmRequestOptions::default(),
        )
        .await
        .map_err(|e| ChorusError::completion(format!("holistic insight synthesis failed: {e}")))?;

    let text = response.content.unwrap_or_default();
    let mut findings = parse_numbered_lines(&text);
    if findings.is_empty() {
        findings = parse_bullet_lines(&text);
    }
    if findings.is_empty() {
        findings = keyword_finding_lines(&text);
        if !findings.is_empty() {
            warn!(agent = %record.id, "holistic insight response did not parse as a list; fell back to keyword extraction");
        }
    }
    findings.truncate(config.max_holistic_insights);
    Ok(findings)
}

fn build_execution_system(record: &AgentRecord) -> String {
    let mut system = format!(
        "You are an autonomous agent executing a task plan step by step. Objective: {}.",
        record.objective
    );
    if !record.tool_names.is_empty() {
        system.push_str(&format!(
            " Tools at your disposal: {}.",
            record.tool_names.join(", ")
        ));
    }
    system.push_str(" Execute only the current step and report its outcome.");
    system
}

fn build_step_prompt(record: &AgentRecord, index: usize, total: usize) -> String {
    let step = &record.plan[index];
    let mut prompt = format!(
        "## Current Step ({} of {})\n{}\n",
        index + 1,
        total,
        step.title
    );
    if let Some(prev) = index.checked_sub(1).and_then(|i| record.plan.get(i)) {
        prompt.push_str(&format!("\nPreceding step: {}\n", prev.title));
    }
    if let Some(next) = record.plan.get(index + 1) {
        prompt.push_str(&format!("Upcoming step: {}\n", next.title));
    }
    if !record.clarifying_answers.is_empty() {
        // BTreeMap for a stable prompt ordering
        let ordered: BTreeMap<_, _> = record.clarifying_answers.iter().collect();
        prompt.push_str("\n## Clarifications\n");
        for (question, answer) in ordered {
            prompt.push_str(&format!("- Q: {question}\n  A: {answer}\n"));
        }
    }
    prompt.push_str("\nExecute this step and report the outcome.");
    prompt
}

pub(crate) fn turn_to_message(turn: &ConversationTurn) -> Message {
    let role = match turn.role {
        crate::models::agent::TurnRole::User => MessageRole::User,
        crate::models::agent::TurnRole::Assistant => MessageRole::Assistant,
    };
    Message::text(role, turn.text.clone())
}

async fn save_state(record: &RwLock<AgentRecord>, store: &dyn AgentStateStore) {
    let snapshot = record.read().await.clone();
    if let Err(e) = store.save_agent_state(&snapshot).await {
        warn!(agent = %snapshot.id, "state save failed: {e}");
    }
}
