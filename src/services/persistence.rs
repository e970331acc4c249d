//! Fire-and-forget persistence of the desired state.
//!
//! Writes go through one writer task so they reach the store in the order
//! the user made them; the last click always wins. Failures are logged and
//! never retried: the next user action or reload tries again naturally.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::domain::models::DesiredState;
use crate::domain::ports::StateStore;

/// Sending half of the persistence writer.
#[derive(Clone)]
pub struct PersistenceWriter {
    tx: mpsc::UnboundedSender<DesiredState>,
}

impl PersistenceWriter {
    /// Spawn the writer task for `key`.
    pub fn spawn(store: Arc<dyn StateStore>, key: impl Into<String>) -> (Self, JoinHandle<()>) {
        let key = key.into();
        let (tx, mut rx) = mpsc::unbounded_channel::<DesiredState>();

        let task = tokio::spawn(async move {
            while let Some(state) = rx.recv().await {
                match store.set(&key, state).await {
                    Ok(()) => info!(key = %key, desired = %state, "saved desired state to storage"),
                    Err(err) => warn!(
                        key = %key,
                        desired = %state,
                        error = %err,
                        "failed to persist desired state; keeping it in memory only"
                    ),
                }
            }
        });

        (Self { tx }, task)
    }

    /// Queue a write. Never blocks and never fails the caller.
    pub fn persist(&self, state: DesiredState) {
        if self.tx.send(state).is_err() {
            warn!(desired = %state, "persistence writer has stopped; state not saved");
        }
    }
}

/// Read the stored desired state, degrading every failure to "absent".
pub async fn load_desired(store: &dyn StateStore, key: &str) -> Option<DesiredState> {
    match store.get(key).await {
        Ok(Some(state)) => {
            info!(key = %key, desired = %state, "loaded desired state from storage");
            Some(state)
        }
        Ok(None) => {
            info!(key = %key, "no stored state found, defaulting to off");
            None
        }
        Err(err) => {
            warn!(key = %key, error = %err, "failed to load desired state, defaulting to off");
            None
        }
    }
}
