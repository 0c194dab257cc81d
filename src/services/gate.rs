//! Await-With-Deadline Gate
//!
//! Suspension primitive for the approval waits: a oneshot future paired
//! with a ceiling. The wait resolves with a default value when the deadline
//! passes unresolved — a slow or absent approver never stalls execution.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::timeout;

/// One-time gate resolved externally or by deadline.
pub struct ApprovalGate<T> {
    tx: Mutex<Option<oneshot::Sender<T>>>,
    rx: tokio::sync::Mutex<Option<oneshot::Receiver<T>>>,
}

impl<T: Send> ApprovalGate<T> {
    pub fn new() -> Self {
        let (tx, rx) = oneshot::channel();
        Self {
            tx: Mutex::new(Some(tx)),
            rx: tokio::sync::Mutex::new(Some(rx)),
        }
    }

    /// Resolve the gate with `value`. Only the first resolution counts;
    /// returns `false` when the gate was already resolved or its wait
    /// already timed out.
    pub fn resolve(&self, value: T) -> bool {
        let sender = self
            .tx
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        match sender {
            Some(tx) => tx.send(value).is_ok(),
            None => false,
        }
    }

    /// Wait for resolution up to `ceiling`, yielding `default` on timeout or
    /// when the gate was already consumed.
    pub async fn wait(&self, ceiling: Duration, default: T) -> T {
        let receiver = self.rx.lock().await.take();
        let Some(rx) = receiver else {
            return default;
        };
        match timeout(ceiling, rx).await {
            Ok(Ok(value)) => value,
            Ok(Err(_)) | Err(_) => default,
        }
    }
}

impl<T: Send> Default for ApprovalGate<T> {
    fn default() -> Self {
        Self::new()
    }
}
