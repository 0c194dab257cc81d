//! Event Sink
//!
//! Fire-and-forget publication of lifecycle and synthesis events to an
//! external subscriber (UI/transport layer). No acknowledgment is expected;
//! a slow or absent subscriber never blocks the core.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;

/// Named events published by the orchestration core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ChorusEvent {
    PhaseStarted {
        agent_id: String,
        phase: u8,
    },
    PlanGenerated {
        agent_id: String,
        step_count: usize,
    },
    StepStarted {
        agent_id: String,
        step_id: String,
    },
    StepCompleted {
        agent_id: String,
        step_id: String,
    },
    StepFailed {
        agent_id: String,
        step_id: String,
        error: String,
    },
    Completed {
        agent_id: String,
    },
    Error {
        /// Absent for orchestrator-level failures
        agent_id: Option<String>,
        message: String,
    },
    InsightsReported {
        agent_id: String,
        submitted: usize,
        accepted: usize,
    },
    SynthesisStarted {
        agent_count: usize,
    },
    SynthesisUpdated {
        key_findings: usize,
        contradictions: usize,
    },
}

/// Destination for published events.
///
/// `emit` must not block and must not suspend; implementations drop events
/// they cannot deliver.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: ChorusEvent);
}

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: ChorusEvent) {}
}

/// Sink backed by a bounded channel. Events are dropped when the receiver
/// lags or has gone away.
pub struct ChannelSink {
    tx: mpsc::Sender<ChorusEvent>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<ChorusEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }

    /// Create a sink whose receiving end is a `Stream` of events.
    pub fn stream(capacity: usize) -> (Self, ReceiverStream<ChorusEvent>) {
        let (sink, rx) = Self::new(capacity);
        (sink, ReceiverStream::new(rx))
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: ChorusEvent) {
        let _ = self.tx.try_send(event);
    }
}
