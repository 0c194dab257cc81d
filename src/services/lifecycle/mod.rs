//! Agent Lifecycle Controller
//!
//! Drives one agent through the four-phase lifecycle:
//! plan -> clarify/approve -> execute -> synthesize.
//!
//! States: `queued -> planning -> plan_ready -> awaiting_approval -> running
//! -> [completed | error]`, with `paused` reachable from `running` via
//! `stop()` and `awaiting_clarification` optionally inserted before
//! `awaiting_approval`.
//!
//! The two approval waits are bounded: an unconfirmed plan auto-proceeds
//! after its ceiling, and an unanswered approval proceeds with empty
//! answers. A completion-service error in any phase aborts the run and is
//! never retried.

pub mod clarifier;
pub mod executor;
pub mod parse;
pub mod planner;
pub mod synthesizer;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::models::agent::{AgentRecord, AgentSpec, AgentStatus, ConversationTurn, Deliverable};
use crate::models::insight::InsightMetadata;
use crate::services::events::{ChorusEvent, EventSink};
use crate::services::gate::ApprovalGate;
use crate::services::insights::InsightLedger;
use crate::services::llm::{CompletionProvider, LlmRequestOptions, Message};
use crate::services::store::AgentStateStore;
use crate::utils::error::{ChorusError, ChorusResult};

use executor::{turn_to_message, ExecutionOutcome};

/// Timings and bounds for one agent's lifecycle.
#[derive(Debug, Clone)]
pub struct LifecycleConfig {
    /// Ceiling for the plan confirmation wait; the run auto-proceeds after it
    pub plan_confirm_timeout: Duration,
    /// Ceiling for the approval wait; the run proceeds with empty answers after it
    pub approval_timeout: Duration,
    /// Upper bound on generated plan steps
    pub max_plan_steps: usize,
    /// Upper bound on holistic findings submitted to the ledger
    pub max_holistic_insights: usize,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            plan_confirm_timeout: Duration::from_secs(20 * 60),
            approval_timeout: Duration::from_secs(60),
            max_plan_steps: 8,
            max_holistic_insights: 10,
        }
    }
}

impl LifecycleConfig {
    pub fn with_plan_confirm_timeout(mut self, timeout: Duration) -> Self {
        self.plan_confirm_timeout = timeout;
        self
    }

    pub fn with_approval_timeout(mut self, timeout: Duration) -> Self {
        self.approval_timeout = timeout;
        self
    }

    pub fn with_max_plan_steps(mut self, max: usize) -> Self {
        self.max_plan_steps = max;
        self
    }
}

/// Per-agent state machine driving the four phases.
///
/// Owns one agent record; calls out to the completion service, the shared
/// insight ledger, the persistence collaborator, and the event sink.
pub struct AgentController {
    agent_id: String,
    agent_name: String,
    clarify: bool,
    record: Arc<RwLock<AgentRecord>>,
    provider: Arc<dyn CompletionProvider>,
    ledger: Arc<InsightLedger>,
    store: Arc<dyn AgentStateStore>,
    events: Arc<dyn EventSink>,
    config: LifecycleConfig,
    plan_gate: ApprovalGate<()>,
    approval_gate: ApprovalGate<HashMap<String, String>>,
    stop: CancellationToken,
}

impl AgentController {
    pub fn new(
        spec: AgentSpec,
        provider: Arc<dyn CompletionProvider>,
        ledger: Arc<InsightLedger>,
        store: Arc<dyn AgentStateStore>,
        events: Arc<dyn EventSink>,
        config: LifecycleConfig,
    ) -> Self {
        let clarify = spec.clarify;
        let record = AgentRecord::new(spec);
        Self {
            agent_id: record.id.clone(),
            agent_name: record.name.clone(),
            clarify,
            record: Arc::new(RwLock::new(record)),
            provider,
            ledger,
            store,
            events,
            config,
            plan_gate: ApprovalGate::new(),
            approval_gate: ApprovalGate::new(),
            stop: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.agent_id
    }

    pub fn name(&self) -> &str {
        &self.agent_name
    }

    /// Current copy of the agent record.
    pub async fn record(&self) -> AgentRecord {
        self.record.read().await.clone()
    }

    pub async fn status(&self) -> AgentStatus {
        self.record.read().await.status
    }

    pub async fn phase(&self) -> u8 {
        self.record.read().await.current_phase
    }

    /// Confirm the generated plan, releasing the phase-1 wait.
    pub fn confirm_plan(&self) -> bool {
        self.plan_gate.resolve(())
    }

    /// Submit clarifying answers, releasing the phase-2 wait. Answers are
    /// optional; an empty map approves as-is.
    pub fn submit_approval(&self, answers: HashMap<String, String>) -> bool {
        self.approval_gate.resolve(answers)
    }

    /// Request a cooperative stop. The execution loop exits after the current
    /// step; an in-flight completion call is not interrupted.
    pub fn stop(&self) {
        self.stop.cancel();
    }

    /// Run the four-phase lifecycle to completion.
    ///
    /// Returns `Ok(Some(deliverable))` on full completion, `Ok(None)` when a
    /// stop request paused the run, and `Err` when any phase aborted — in
    /// which case the record carries status `Error` and the message.
    pub async fn start(&self) -> ChorusResult<Option<Deliverable>> {
        match self.run_phases().await {
            Ok(outcome) => Ok(outcome),
            Err(err) => {
                let message = err.to_string();
                {
                    let mut rec = self.record.write().await;
                    rec.status = AgentStatus::Error;
                    rec.error_message = Some(message.clone());
                    rec.touch();
                }
                self.save_state().await;
                self.events.emit(ChorusEvent::Error {
                    agent_id: Some(self.agent_id.clone()),
                    message,
                });
                Err(err)
            }
        }
    }

    /// Chat with the agent in any non-terminal state. Appends the exchange to
    /// the conversation history; does not affect phase or status.
    pub async fn chat(&self, message: &str) -> ChorusResult<String> {
        let (messages, system) = {
            let rec = self.record.read().await;
            if rec.status.is_terminal() {
                return Err(ChorusError::validation(format!(
                    "agent {} is {} and no longer accepts chat",
                    rec.id, rec.status
                )));
            }
            let mut messages: Vec<Message> = rec.conversation.iter().map(turn_to_message).collect();
            messages.push(Message::user(message));
            let system = format!(
                "You are an agent working on: {}. Answer in the context of the work so far.",
                rec.objective
            );
            (messages, system)
        };

        let response = self
            .provider
            .send_message(messages, Some(system), vec![], LlmRequestOptions::default())
            .await
            .map_err(|e| ChorusError::completion(format!("chat failed: {e}")))?;

        let reply = response.content.unwrap_or_default();
        {
            let mut rec = self.record.write().await;
            rec.conversation.push(ConversationTurn::user(message));
            rec.conversation.push(ConversationTurn::assistant(reply.clone()));
            rec.touch();
        }
        Ok(reply)
    }

    async fn run_phases(&self) -> ChorusResult<Option<Deliverable>> {
        // ── Phase 1: Plan ───────────────────────────────────────────────
        self.begin_phase(1, AgentStatus::Planning).await?;

        let snapshot = self.record().await;
        let plan = planner::generate_plan(&snapshot, &self.config, self.provider.as_ref()).await?;
        let step_count = plan.len();
        {
            let mut rec = self.record.write().await;
            rec.plan = plan;
            rec.transition_to(AgentStatus::PlanReady)?;
        }
        self.events.emit(ChorusEvent::PlanGenerated {
            agent_id: self.agent_id.clone(),
            step_count,
        });
        self.save_state().await;

        // Suspend until confirmed; auto-proceed with the plan unchanged when
        // the ceiling elapses.
        self.plan_gate
            .wait(self.config.plan_confirm_timeout, ())
            .await;

        // ── Phase 2: Approve ────────────────────────────────────────────
        {
            let mut rec = self.record.write().await;
            rec.set_phase(2);
        }
        self.events.emit(ChorusEvent::PhaseStarted {
            agent_id: self.agent_id.clone(),
            phase: 2,
        });

        let mut has_questions = false;
        if self.clarify {
            let snapshot = self.record().await;
            let questions =
                clarifier::generate_questions(&snapshot, self.provider.as_ref()).await?;
            if !questions.is_empty() {
                let mut rec = self.record.write().await;
                rec.clarifying_questions = questions;
                rec.transition_to(AgentStatus::AwaitingClarification)?;
                has_questions = true;
            }
        }
        if !has_questions {
            let mut rec = self.record.write().await;
            rec.transition_to(AgentStatus::AwaitingApproval)?;
        }
        self.save_state().await;

        // Suspend until approved; proceed with empty answers when the ceiling
        // elapses.
        let answers = self
            .approval_gate
            .wait(self.config.approval_timeout, HashMap::new())
            .await;
        {
            let mut rec = self.record.write().await;
            if rec.status == AgentStatus::AwaitingClarification {
                rec.transition_to(AgentStatus::AwaitingApproval)?;
            }
            rec.clarifying_answers = answers;
            rec.touch();
        }

        // ── Phase 3: Execute ────────────────────────────────────────────
        self.begin_phase(3, AgentStatus::Running).await?;

        let outcome = executor::execute_plan(
            &self.record,
            self.provider.as_ref(),
            self.store.as_ref(),
            self.events.as_ref(),
            &self.stop,
        )
        .await?;

        if outcome == ExecutionOutcome::Stopped {
            {
                let mut rec = self.record.write().await;
                rec.transition_to(AgentStatus::Paused)?;
            }
            self.save_state().await;
            info!(agent = %self.agent_id, "run paused by stop request");
            return Ok(None);
        }

        let snapshot = self.record().await;
        let findings =
            executor::holistic_insights(&snapshot, &self.config, self.provider.as_ref()).await?;
        if !findings.is_empty() {
            let accepted = self.ledger.submit(
                &self.agent_id,
                &self.agent_name,
                &findings,
                InsightMetadata::for_phase(3),
            );
            {
                let mut rec = self.record.write().await;
                rec.holistic_insights = findings.clone();
                rec.touch();
            }
            self.events.emit(ChorusEvent::InsightsReported {
                agent_id: self.agent_id.clone(),
                submitted: findings.len(),
                accepted: accepted.len(),
            });
            self.save_state().await;
        }

        // ── Phase 4: Synthesize ─────────────────────────────────────────
        {
            let mut rec = self.record.write().await;
            rec.set_phase(4);
        }
        self.events.emit(ChorusEvent::PhaseStarted {
            agent_id: self.agent_id.clone(),
            phase: 4,
        });

        let snapshot = self.record().await;
        let deliverable =
            synthesizer::synthesize_deliverable(&snapshot, self.provider.as_ref()).await?;
        {
            let mut rec = self.record.write().await;
            rec.deliverable = Some(deliverable.clone());
            rec.transition_to(AgentStatus::Completed)?;
        }
        self.events.emit(ChorusEvent::Completed {
            agent_id: self.agent_id.clone(),
        });
        self.save_state().await;

        Ok(Some(deliverable))
    }

    async fn begin_phase(&self, phase: u8, status: AgentStatus) -> ChorusResult<()> {
        {
            let mut rec = self.record.write().await;
            rec.set_phase(phase);
            rec.transition_to(status)?;
        }
        self.events.emit(ChorusEvent::PhaseStarted {
            agent_id: self.agent_id.clone(),
            phase,
        });
        Ok(())
    }

    async fn save_state(&self) {
        let record = self.record.read().await.clone();
        if let Err(e) = self.store.save_agent_state(&record).await {
            warn!(agent = %record.id, "state save failed: {e}");
        }
    }
}
