//! Shared test fixtures: scripted completion providers and short lifecycle
//! timings.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use agent_chorus::{
    CompletionProvider, LifecycleConfig, LlmError, LlmRequestOptions, LlmResponse, LlmResult,
    Message, ToolDefinition,
};

/// Scripted provider that answers each lifecycle call based on the system
/// instruction it receives. Optionally sleeps per call and can be switched
/// into a failing mode for execution-step calls.
pub struct ScriptedProvider {
    pub calls: AtomicUsize,
    pub fail_steps: AtomicBool,
    delay: Duration,
    step_count: usize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::with_steps(5)
    }

    /// Provider whose generated plan has `step_count` steps.
    pub fn with_steps(step_count: usize) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_steps: AtomicBool::new(false),
            delay: Duration::ZERO,
            step_count,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn plan_text(&self) -> String {
        (1..=self.step_count)
            .map(|i| format!("{i}. Work through planned activity number {i}"))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl CompletionProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn send_message(
        &self,
        messages: Vec<Message>,
        system: Option<String>,
        _tools: Vec<ToolDefinition>,
        _options: LlmRequestOptions,
    ) -> LlmResult<LlmResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }

        let system = system.unwrap_or_default();
        let text = if system.contains("actionable steps") {
            self.plan_text()
        } else if system.contains("clarifying questions") {
            "1. Which quarter should the analysis cover?\n2. Should forecasts be included?"
                .to_string()
        } else if system.contains("cross-cutting") {
            "1. Revenue growth concentrated in two regions\n\
             2. Cost discipline held across every step\n\
             3. Hiring slowed in the second half\n\
             4. Churn risk clusters in the enterprise tier\n\
             5. Forecast confidence depends on pipeline quality\n\
             6. Tooling gaps delayed data gathering"
                .to_string()
        } else if system.contains("executive takeaway") {
            "- Quarterly targets were met with margin to spare\n\
             - Two regions drive most of the upside\n\
             - Costs stayed flat quarter over quarter\n\
             - Enterprise churn needs near-term attention\n\
             - Outlook for next quarter remains positive"
                .to_string()
        } else if system.contains("executive summary") {
            "- Agents agree the quarter outperformed plan\n\
             - Regional concentration is the common risk theme"
                .to_string()
        } else if system.contains("contradictions") {
            "Alpha reports flat costs while Beta reports rising costs.".to_string()
        } else {
            // Execution-step call
            if self.fail_steps.load(Ordering::SeqCst) {
                return Err(LlmError::ServerError {
                    message: "scripted outage".to_string(),
                    status: Some(503),
                });
            }
            let step_hint = messages
                .last()
                .map(|m| m.content.lines().nth(1).unwrap_or("").to_string())
                .unwrap_or_default();
            format!("Completed call {call}: {step_hint}")
        };

        Ok(LlmResponse::text(text, "scripted-model"))
    }
}

/// Lifecycle timings short enough for tests: both gates elapse in tens of
/// milliseconds instead of minutes.
pub fn fast_config() -> LifecycleConfig {
    LifecycleConfig::default()
        .with_plan_confirm_timeout(Duration::from_millis(40))
        .with_approval_timeout(Duration::from_millis(20))
}
