//! Cross-Agent Orchestrator
//!
//! Fan-in aggregator: receives a deliverable from each completed agent,
//! debounces near-simultaneous arrivals, and drives a two-step synthesis
//! (executive summary, then contradiction scan) over the completion service.
//!
//! `synthesize()` never runs twice concurrently: the status guard makes a
//! trigger during an in-flight pass a no-op. A failed pass leaves the prior
//! summary and contradictions untouched.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::models::agent::Deliverable;
use crate::models::orchestrator::{OrchestratorSnapshot, ReceivedDeliverable, SynthesisStatus};
use crate::services::events::{ChorusEvent, EventSink};
use crate::services::llm::{CompletionProvider, LlmRequestOptions, Message};
use crate::utils::error::{ChorusError, ChorusResult};

pub(crate) const SUMMARY_SYSTEM: &str = "You combine the deliverables of several independent agents \
    into one executive summary. Respond with 5-8 bullet points capturing the overall picture.";

pub(crate) const CONTRADICTION_SYSTEM: &str = "You look for contradictions between data points \
    reported by different agents. List each contradiction on its own line. \
    If there are none, respond with: No contradictions found.";

/// Debounce and truncation bounds for cross-agent synthesis.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Quiet period after a deliverable arrives before synthesis runs
    pub debounce: Duration,
    /// Contradiction lines kept, in response order
    pub max_contradictions: usize,
    /// Key findings kept, in deliverable order
    pub max_key_findings: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_secs(2),
            max_contradictions: 5,
            max_key_findings: 10,
        }
    }
}

impl OrchestratorConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }
}

/// Fan-in aggregator over agent deliverables. One instance per engagement.
pub struct Orchestrator {
    provider: Arc<dyn CompletionProvider>,
    events: Arc<dyn EventSink>,
    config: OrchestratorConfig,
    snapshot: RwLock<OrchestratorSnapshot>,
    debounce_scheduled: AtomicBool,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn CompletionProvider>, events: Arc<dyn EventSink>) -> Self {
        Self::with_config(provider, events, OrchestratorConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn CompletionProvider>,
        events: Arc<dyn EventSink>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            provider,
            events,
            config,
            snapshot: RwLock::new(OrchestratorSnapshot::default()),
            debounce_scheduled: AtomicBool::new(false),
        }
    }

    /// Current copy of the aggregation state.
    pub async fn snapshot(&self) -> OrchestratorSnapshot {
        self.snapshot.read().await.clone()
    }

    /// Store an agent's deliverable (last write per agent wins). Once at
    /// least two distinct agents have reported and synthesis is idle, one
    /// synthesis pass is scheduled after the debounce delay, coalescing
    /// bursts of arrivals.
    pub async fn receive_deliverable(
        self: &Arc<Self>,
        agent_id: &str,
        agent_name: &str,
        deliverable: Deliverable,
    ) {
        let should_schedule = {
            let mut snap = self.snapshot.write().await;
            snap.deliverables.insert(
                agent_id.to_string(),
                ReceivedDeliverable {
                    agent_name: agent_name.to_string(),
                    deliverable,
                    received_at: Utc::now(),
                },
            );
            snap.deliverables.len() >= 2 && snap.synthesis_status == SynthesisStatus::Idle
        };

        if should_schedule && !self.debounce_scheduled.swap(true, Ordering::SeqCst) {
            let this = Arc::clone(self);
            tokio::spawn(async move {
                tokio::time::sleep(this.config.debounce).await;
                this.debounce_scheduled.store(false, Ordering::SeqCst);
                if let Err(e) = this.synthesize().await {
                    warn!("scheduled synthesis failed: {e}");
                }
            });
        }
    }

    /// Run the two-step synthesis over every stored deliverable.
    ///
    /// A trigger while a pass is in flight is a no-op. On failure the status
    /// becomes `Error` and the prior outputs are left untouched; calling
    /// again retries.
    pub async fn synthesize(&self) -> ChorusResult<()> {
        let inputs = {
            let mut snap = self.snapshot.write().await;
            if snap.synthesis_status == SynthesisStatus::Synthesizing {
                debug!("synthesis already in flight; ignoring trigger");
                return Ok(());
            }
            if snap.deliverables.is_empty() {
                return Err(ChorusError::validation(
                    "no deliverables available for synthesis",
                ));
            }
            snap.synthesis_status = SynthesisStatus::Synthesizing;

            let mut inputs: Vec<ReceivedDeliverable> = snap.deliverables.values().cloned().collect();
            inputs.sort_by(|a, b| a.agent_name.cmp(&b.agent_name));
            inputs
        };

        self.events.emit(ChorusEvent::SynthesisStarted {
            agent_count: inputs.len(),
        });

        match self.run_synthesis(&inputs).await {
            Ok((summary, contradictions, key_findings)) => {
                let (findings_len, contradictions_len) = (key_findings.len(), contradictions.len());
                {
                    // Single write-lock acquisition: external readers never
                    // observe a partially updated snapshot.
                    let mut snap = self.snapshot.write().await;
                    snap.executive_summary = Some(summary);
                    snap.contradictions = contradictions;
                    snap.key_findings = key_findings;
                    snap.synthesis_status = SynthesisStatus::Completed;
                    snap.last_synthesis_at = Some(Utc::now());
                }
                self.events.emit(ChorusEvent::SynthesisUpdated {
                    key_findings: findings_len,
                    contradictions: contradictions_len,
                });
                Ok(())
            }
            Err(e) => {
                {
                    let mut snap = self.snapshot.write().await;
                    snap.synthesis_status = SynthesisStatus::Error;
                }
                self.events.emit(ChorusEvent::Error {
                    agent_id: None,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// Clear the snapshot back to its initial empty state, for a new
    /// engagement.
    pub async fn reset(&self) {
        let mut snap = self.snapshot.write().await;
        *snap = OrchestratorSnapshot::default();
    }

    async fn run_synthesis(
        &self,
        inputs: &[ReceivedDeliverable],
    ) -> ChorusResult<(String, Vec<String>, Vec<String>)> {
        // Step 1: executive summary over the full deliverable texts.
        let mut summary_prompt = String::from("## Agent Deliverables\n\n");
        for received in inputs {
            summary_prompt.push_str(&format!(
                "### {}\n{}\n\n",
                received.agent_name, received.deliverable.content
            ));
        }
        summary_prompt.push_str("Produce the combined executive summary.");

        let summary_response = self
            .provider
            .send_message(
                vec![Message::user(summary_prompt)],
                Some(SUMMARY_SYSTEM.to_string()),
                vec![],
                LlmRequestOptions::default(),
            )
            .await
            .map_err(|e| ChorusError::completion(format!("summary synthesis failed: {e}")))?;
        let summary = summary_response.content.unwrap_or_default();

        // Step 2: contradiction scan over extracted data points only.
        let mut points_prompt = String::from("## Reported Data Points\n\n");
        for received in inputs {
            for point in &received.deliverable.data_points {
                points_prompt.push_str(&format!("- [{}] {}\n", received.agent_name, point));
            }
        }
        points_prompt.push_str("\nList the contradictions.");

        let contradiction_response = self
            .provider
            .send_message(
                vec![Message::user(points_prompt)],
                Some(CONTRADICTION_SYSTEM.to_string()),
                vec![],
                LlmRequestOptions::default(),
            )
            .await
            .map_err(|e| ChorusError::completion(format!("contradiction scan failed: {e}")))?;

        // Bounded line-split heuristic, not a parser.
        let contradictions: Vec<String> = contradiction_response
            .content
            .unwrap_or_default()
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(self.config.max_contradictions)
            .map(String::from)
            .collect();

        let key_findings: Vec<String> = inputs
            .iter()
            .flat_map(|received| received.deliverable.data_points.iter().cloned())
            .take(self.config.max_key_findings)
            .collect();

        Ok((summary, contradictions, key_findings))
    }
}
