//! Cross-agent fan-in integration tests
//!
//! Cover the debounce that coalesces near-simultaneous deliverable arrivals
//! into one synthesis pass, and the full pipeline where two live agent runs
//! feed the shared ledger and the orchestrator.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use agent_chorus::{
    AgentController, AgentSpec, Deliverable, InsightLedger, MemoryStateStore, NullSink,
    Orchestrator, OrchestratorConfig, SynthesisStatus,
};

use crate::common::{fast_config, ScriptedProvider};

fn deliverable(points: &[&str]) -> Deliverable {
    Deliverable {
        content: points
            .iter()
            .map(|p| format!("- {p}"))
            .collect::<Vec<_>>()
            .join("\n"),
        data_points: points.iter().map(|p| p.to_string()).collect(),
        created_at: Utc::now(),
    }
}

fn orchestrator(provider: Arc<ScriptedProvider>, debounce: Duration) -> Arc<Orchestrator> {
    Arc::new(Orchestrator::with_config(
        provider,
        Arc::new(NullSink),
        OrchestratorConfig::default().with_debounce(debounce),
    ))
}

#[tokio::test]
async fn test_two_arrivals_coalesce_into_one_synthesis() {
    let provider = Arc::new(ScriptedProvider::new());
    let orch = orchestrator(Arc::clone(&provider), Duration::from_millis(100));

    // Two agents report within 500ms of each other
    orch.receive_deliverable("a-1", "alpha", deliverable(&["costs are flat", "growth is up"]))
        .await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    orch.receive_deliverable("a-2", "beta", deliverable(&["costs are rising steadily"]))
        .await;

    tokio::time::sleep(Duration::from_millis(300)).await;

    // Exactly one pass ran: one summary call plus one contradiction call
    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);

    let snap = orch.snapshot().await;
    assert_eq!(snap.synthesis_status, SynthesisStatus::Completed);
    assert_eq!(snap.deliverables.len(), 2);
    // The pass included both agents' data points
    assert!(snap.key_findings.contains(&"growth is up".to_string()));
    assert!(snap
        .key_findings
        .contains(&"costs are rising steadily".to_string()));
    assert!(snap.executive_summary.is_some());
    assert_eq!(snap.contradictions.len(), 1);
}

#[tokio::test]
async fn test_single_agent_does_not_trigger_synthesis() {
    let provider = Arc::new(ScriptedProvider::new());
    let orch = orchestrator(Arc::clone(&provider), Duration::from_millis(30));

    orch.receive_deliverable("a-1", "alpha", deliverable(&["only one voice"]))
        .await;
    tokio::time::sleep(Duration::from_millis(150)).await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    assert_eq!(orch.snapshot().await.synthesis_status, SynthesisStatus::Idle);
}

#[tokio::test]
async fn test_burst_of_three_coalesces() {
    let provider = Arc::new(ScriptedProvider::new());
    let orch = orchestrator(Arc::clone(&provider), Duration::from_millis(80));

    for (id, name) in [("a-1", "alpha"), ("a-2", "beta"), ("a-3", "gamma")] {
        orch.receive_deliverable(id, name, deliverable(&[name]))
            .await;
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    tokio::time::sleep(Duration::from_millis(300)).await;

    assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    let snap = orch.snapshot().await;
    assert_eq!(snap.deliverables.len(), 3);
    assert_eq!(snap.key_findings.len(), 3);
}

#[tokio::test]
async fn test_two_live_agents_feed_ledger_and_orchestrator() {
    let provider = Arc::new(ScriptedProvider::new());
    let ledger = Arc::new(InsightLedger::new());
    let store = Arc::new(MemoryStateStore::new());
    let orch = orchestrator(Arc::clone(&provider), Duration::from_millis(50));

    let mut deliverables = Vec::new();
    for name in ["alpha", "beta"] {
        let ctrl = AgentController::new(
            AgentSpec::new(name, "summarize quarterly performance"),
            Arc::clone(&provider) as Arc<dyn agent_chorus::CompletionProvider>,
            Arc::clone(&ledger),
            Arc::clone(&store) as Arc<dyn agent_chorus::AgentStateStore>,
            Arc::new(NullSink),
            fast_config(),
        );
        let deliverable = ctrl.start().await.unwrap().expect("run completes");
        deliverables.push((ctrl.id().to_string(), name, deliverable));
    }

    // Both agents reported the same holistic findings; the ledger accepted
    // them once across agents.
    assert_eq!(ledger.len(), 6);

    for (id, name, d) in deliverables {
        orch.receive_deliverable(&id, name, d).await;
    }
    tokio::time::sleep(Duration::from_millis(250)).await;

    let snap = orch.snapshot().await;
    assert_eq!(snap.synthesis_status, SynthesisStatus::Completed);
    assert_eq!(snap.deliverables.len(), 2);
    assert!(snap
        .executive_summary
        .as_deref()
        .unwrap()
        .contains("outperformed"));
}
