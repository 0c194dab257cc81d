//! Agent lifecycle integration tests
//!
//! Cover the four-phase run end to end: bounded approval waits with
//! auto-proceed, strictly sequential step execution, cooperative stop
//! semantics, and phase-scoped failure handling.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use agent_chorus::{
    AgentController, AgentSpec, AgentStateStore, AgentStatus, ChannelSink, ChorusEvent,
    InsightLedger, LifecycleConfig, MemoryStateStore, NullSink, StepStatus,
};

use crate::common::{fast_config, ScriptedProvider};

fn controller(
    spec: AgentSpec,
    provider: Arc<ScriptedProvider>,
    config: LifecycleConfig,
) -> (Arc<AgentController>, Arc<InsightLedger>, Arc<MemoryStateStore>) {
    let ledger = Arc::new(InsightLedger::new());
    let store = Arc::new(MemoryStateStore::new());
    let ctrl = Arc::new(AgentController::new(
        spec,
        provider,
        Arc::clone(&ledger),
        Arc::clone(&store) as Arc<dyn AgentStateStore>,
        Arc::new(NullSink),
        config,
    ));
    (ctrl, ledger, store)
}

async fn wait_for_status(ctrl: &AgentController, status: AgentStatus) {
    for _ in 0..500 {
        if ctrl.status().await == status {
            return;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("agent never reached status {status}");
}

#[tokio::test]
async fn test_end_to_end_completes_without_confirmation() {
    let provider = Arc::new(ScriptedProvider::new());
    let spec = AgentSpec::new("analyst", "summarize quarterly performance");
    let (ctrl, ledger, store) = controller(spec, provider, fast_config());

    // Neither gate is ever resolved: both ceilings elapse and the run
    // auto-proceeds with the plan unchanged and empty answers.
    let deliverable = ctrl.start().await.unwrap().expect("run should complete");
    assert!(!deliverable.content.is_empty());
    assert!(!deliverable.data_points.is_empty());

    let record = ctrl.record().await;
    assert_eq!(record.status, AgentStatus::Completed);
    assert_eq!(record.current_phase, 4);
    assert!(record.clarifying_answers.is_empty());
    assert_eq!(record.plan.len(), 5);
    for step in &record.plan {
        assert_eq!(step.status, StepStatus::Completed);
        assert_eq!(step.progress, 100);
        let started = step.started_at.expect("step ran");
        let completed = step.completed_at.expect("step finished");
        assert!(completed >= started);
    }

    // Steps executed strictly in order
    for pair in record.plan.windows(2) {
        assert!(pair[1].started_at.unwrap() >= pair[0].completed_at.unwrap());
    }

    // Holistic findings reached the shared ledger
    assert_eq!(record.holistic_insights.len(), 6);
    assert_eq!(ledger.len(), 6);

    // Opportunistic persistence kept up
    let persisted = store
        .get_agent_state(ctrl.id())
        .await
        .unwrap()
        .expect("record was saved");
    assert_eq!(persisted.status, AgentStatus::Completed);
}

#[tokio::test]
async fn test_gates_resolve_early() {
    let provider = Arc::new(ScriptedProvider::new());
    let spec = AgentSpec::new("researcher", "map the competitive landscape").with_clarification();
    // Long ceilings: the test only passes quickly if resolution works.
    let config = LifecycleConfig::default()
        .with_plan_confirm_timeout(Duration::from_secs(30))
        .with_approval_timeout(Duration::from_secs(30));
    let (ctrl, _ledger, _store) = controller(spec, provider, config);

    let runner = {
        let ctrl = Arc::clone(&ctrl);
        tokio::spawn(async move { ctrl.start().await })
    };

    wait_for_status(&ctrl, AgentStatus::PlanReady).await;
    assert!(ctrl.confirm_plan());

    wait_for_status(&ctrl, AgentStatus::AwaitingClarification).await;
    let record = ctrl.record().await;
    assert_eq!(record.clarifying_questions.len(), 2);

    let mut answers = HashMap::new();
    answers.insert(
        record.clarifying_questions[0].clone(),
        "Focus on Q3".to_string(),
    );
    assert!(ctrl.submit_approval(answers));

    let deliverable = runner.await.unwrap().unwrap();
    assert!(deliverable.is_some());

    let record = ctrl.record().await;
    assert_eq!(record.status, AgentStatus::Completed);
    assert_eq!(
        record.clarifying_answers.get(&record.clarifying_questions[0]),
        Some(&"Focus on Q3".to_string())
    );
}

#[tokio::test]
async fn test_stop_mid_execution_pauses_after_current_step() {
    let provider = Arc::new(ScriptedProvider::with_steps(5).with_delay(Duration::from_millis(25)));
    let ledger = Arc::new(InsightLedger::new());
    let store = Arc::new(MemoryStateStore::new());
    let (sink, mut events) = ChannelSink::new(64);
    let ctrl = Arc::new(AgentController::new(
        AgentSpec::new("analyst", "summarize quarterly performance"),
        provider,
        ledger,
        store,
        Arc::new(sink),
        fast_config(),
    ));

    let runner = {
        let ctrl = Arc::clone(&ctrl);
        tokio::spawn(async move { ctrl.start().await })
    };

    // Stop once step 2 has started: step 2 finishes, steps 3-5 stay pending.
    loop {
        match events.recv().await.expect("event stream ended early") {
            ChorusEvent::StepStarted { step_id, .. } if step_id == "step-2" => {
                ctrl.stop();
                break;
            }
            _ => {}
        }
    }

    let outcome = runner.await.unwrap().unwrap();
    assert!(outcome.is_none(), "paused run yields no deliverable");

    let record = ctrl.record().await;
    assert_eq!(record.status, AgentStatus::Paused);
    assert_eq!(record.current_phase, 3);
    assert_eq!(record.plan[0].status, StepStatus::Completed);
    assert_eq!(record.plan[1].status, StepStatus::Completed);
    for step in &record.plan[2..] {
        assert_eq!(step.status, StepStatus::Pending);
        assert!(step.started_at.is_none());
    }
    assert!(record.deliverable.is_none());
}

#[tokio::test]
async fn test_step_failure_aborts_run_with_error_status() {
    let provider = Arc::new(ScriptedProvider::new());
    provider
        .fail_steps
        .store(true, std::sync::atomic::Ordering::SeqCst);
    let (ctrl, ledger, _store) = controller(
        AgentSpec::new("analyst", "summarize quarterly performance"),
        provider,
        fast_config(),
    );

    let result = ctrl.start().await;
    assert!(result.is_err());

    let record = ctrl.record().await;
    assert_eq!(record.status, AgentStatus::Error);
    assert!(record.error_message.as_deref().unwrap().contains("failed"));
    assert_eq!(record.plan[0].status, StepStatus::Failed);
    // Steps after the failure were never started
    for step in &record.plan[1..] {
        assert_eq!(step.status, StepStatus::Pending);
    }
    // No holistic pass ran
    assert!(ledger.is_empty());
}

#[tokio::test]
async fn test_chat_is_available_outside_terminal_states() {
    let provider = Arc::new(ScriptedProvider::new());
    let (ctrl, _ledger, _store) = controller(
        AgentSpec::new("analyst", "summarize quarterly performance"),
        provider,
        fast_config(),
    );

    // Queued agents accept chat
    let reply = ctrl.chat("What will you look at first?").await.unwrap();
    assert!(!reply.is_empty());
    let record = ctrl.record().await;
    assert_eq!(record.conversation.len(), 2);
    assert_eq!(record.status, AgentStatus::Queued);

    ctrl.start().await.unwrap();
    assert_eq!(ctrl.status().await, AgentStatus::Completed);

    // Terminal agents do not
    assert!(ctrl.chat("one more thing").await.is_err());
}

#[tokio::test]
async fn test_phase_events_are_monotonic() {
    let provider = Arc::new(ScriptedProvider::new());
    let ledger = Arc::new(InsightLedger::new());
    let store = Arc::new(MemoryStateStore::new());
    let (sink, mut events) = ChannelSink::new(128);
    let ctrl = AgentController::new(
        AgentSpec::new("analyst", "summarize quarterly performance"),
        provider,
        ledger,
        store,
        Arc::new(sink),
        fast_config(),
    );

    ctrl.start().await.unwrap();

    let mut last_phase = 0;
    while let Ok(event) = events.try_recv() {
        if let ChorusEvent::PhaseStarted { phase, .. } = event {
            assert!(phase > last_phase, "phases must only increase");
            last_phase = phase;
        }
    }
    assert_eq!(last_phase, 4);
}
