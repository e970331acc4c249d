//! Single-owner runtime for the reconciliation engine.
//!
//! Every input to the engine (user actions, external changes, suppression
//! expiries, status queries) is a message on one FIFO mailbox, processed by
//! one task. Ordering between those inputs is therefore the order in which
//! they were sent, and `desired`/`suppressed` are never shared.
//!
//! The task also drives startup:
//!
//! ```text
//! Uninitialized -> LoadingState -> WaitingForControl -> Observing
//! ```
//!
//! The mailbox keeps being served while the stored state loads and while the
//! page settles, so a user click is never held back behind startup.

use std::ops::ControlFlow;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::persistence::{load_desired, PersistenceWriter};
use super::reconciliation_engine::{Reconciliation, ReconciliationEngine};
use crate::domain::errors::{DomainResult, ToggleError};
use crate::domain::models::{Config, DesiredState, LiveState, TimingConfig};
use crate::domain::ports::{ControlSurface, StateStore};

/// Startup state machine. `Observing` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StartupPhase {
    Uninitialized,
    LoadingState,
    WaitingForControl,
    Observing,
}

impl StartupPhase {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Uninitialized => "uninitialized",
            Self::LoadingState => "loading_state",
            Self::WaitingForControl => "waiting_for_control",
            Self::Observing => "observing",
        }
    }
}

/// Point-in-time view of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineStatus {
    pub phase: StartupPhase,
    pub desired: DesiredState,
    pub suppressed: bool,
    pub live: LiveState,
}

/// Messages accepted by the engine task.
#[derive(Debug)]
pub enum EngineMessage {
    UserAction {
        observed: DesiredState,
    },
    ExternalChange,
    ApplyDesired {
        reply: oneshot::Sender<Reconciliation>,
    },
    SuppressionExpired {
        generation: u64,
    },
    Status {
        reply: oneshot::Sender<EngineStatus>,
    },
    Shutdown,
}

/// Cloneable handle to a running engine.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::UnboundedSender<EngineMessage>,
    phase: watch::Receiver<StartupPhase>,
}

impl EngineHandle {
    /// Report a genuine user toggle that left the control in `observed`.
    pub fn user_action(&self, observed: DesiredState) -> DomainResult<()> {
        self.send(EngineMessage::UserAction { observed })
    }

    /// Report a relevant DOM change. Dropped until startup has finished.
    pub fn external_change(&self) -> DomainResult<()> {
        self.send(EngineMessage::ExternalChange)
    }

    /// Run one `apply_desired` on the engine task and return its outcome.
    pub async fn apply_desired(&self) -> DomainResult<Reconciliation> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineMessage::ApplyDesired { reply })?;
        rx.await.map_err(|_| ToggleError::EngineStopped)
    }

    /// Snapshot of the engine as seen from its own task.
    pub async fn status(&self) -> DomainResult<EngineStatus> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineMessage::Status { reply })?;
        rx.await.map_err(|_| ToggleError::EngineStopped)
    }

    /// Ask the engine to stop after the messages already queued.
    pub fn shutdown(&self) -> DomainResult<()> {
        self.send(EngineMessage::Shutdown)
    }

    /// Most recently published startup phase.
    pub fn phase(&self) -> StartupPhase {
        *self.phase.borrow()
    }

    /// True once the initial apply has run.
    pub fn is_observing(&self) -> bool {
        self.phase() == StartupPhase::Observing
    }

    /// Resolve once startup has reached `Observing`.
    pub async fn wait_until_observing(&self) -> DomainResult<()> {
        let mut phase = self.phase.clone();
        phase
            .wait_for(|p| *p == StartupPhase::Observing)
            .await
            .map(|_| ())
            .map_err(|_| ToggleError::EngineStopped)
    }

    fn send(&self, message: EngineMessage) -> DomainResult<()> {
        self.tx.send(message).map_err(|_| ToggleError::EngineStopped)
    }
}

/// Builds and spawns the engine task.
pub struct EngineRuntime {
    engine: ReconciliationEngine,
    store: Arc<dyn StateStore>,
    storage_key: String,
    timing: TimingConfig,
    phase: watch::Sender<StartupPhase>,
    user_acted_while_loading: bool,
}

impl EngineRuntime {
    /// Spawn the engine task and start the startup sequence.
    pub fn spawn(
        surface: Arc<dyn ControlSurface>,
        store: Arc<dyn StateStore>,
        config: &Config,
    ) -> (EngineHandle, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (phase_tx, phase_rx) = watch::channel(StartupPhase::Uninitialized);
        let (persistence, _writer) = PersistenceWriter::spawn(store.clone(), config.storage.key.clone());

        let runtime = Self {
            engine: ReconciliationEngine::new(surface, persistence, config.timing.clone(), tx.clone()),
            store,
            storage_key: config.storage.key.clone(),
            timing: config.timing.clone(),
            phase: phase_tx,
            user_acted_while_loading: false,
        };

        let task = tokio::spawn(runtime.run(rx));
        let handle = EngineHandle { tx, phase: phase_rx };
        (handle, task)
    }

    async fn run(mut self, mut inbox: mpsc::UnboundedReceiver<EngineMessage>) {
        self.set_phase(StartupPhase::LoadingState);
        let store = self.store.clone();
        let key = self.storage_key.clone();
        let load = async move { load_desired(store.as_ref(), &key).await };
        tokio::pin!(load);

        let loaded = loop {
            tokio::select! {
                biased;
                message = inbox.recv() => {
                    if self.dispatch(message).is_break() {
                        return;
                    }
                }
                loaded = &mut load => break loaded,
            }
        };

        if self.user_acted_while_loading {
            info!(
                stored = ?loaded,
                desired = %self.engine.desired(),
                "user toggled before storage loaded, keeping their choice"
            );
        } else {
            self.engine.initialize(loaded);
        }

        self.set_phase(StartupPhase::WaitingForControl);
        let settle = tokio::time::sleep(self.timing.settle_delay());
        tokio::pin!(settle);

        loop {
            tokio::select! {
                biased;
                message = inbox.recv() => {
                    if self.dispatch(message).is_break() {
                        return;
                    }
                }
                () = &mut settle => break,
            }
        }

        info!(desired = %self.engine.desired(), "applying initial desired state");
        let outcome = self.engine.apply_desired();
        debug!(?outcome, "initial apply finished");
        self.set_phase(StartupPhase::Observing);
        info!("watching for external changes");

        while let Some(message) = inbox.recv().await {
            if self.handle(message).is_break() {
                break;
            }
        }
        debug!("engine stopped");
    }

    fn dispatch(&mut self, message: Option<EngineMessage>) -> ControlFlow<()> {
        match message {
            Some(message) => self.handle(message),
            None => ControlFlow::Break(()),
        }
    }

    fn handle(&mut self, message: EngineMessage) -> ControlFlow<()> {
        let phase = *self.phase.borrow();
        match message {
            EngineMessage::UserAction { observed } => {
                if phase == StartupPhase::LoadingState {
                    self.user_acted_while_loading = true;
                }
                self.engine.on_user_action(observed);
            }
            EngineMessage::ExternalChange => {
                if phase == StartupPhase::Observing {
                    let outcome = self.engine.on_external_change();
                    debug!(?outcome, "external change handled");
                } else {
                    debug!(phase = phase.as_str(), "not observing yet, dropping external change");
                }
            }
            EngineMessage::ApplyDesired { reply } => {
                let outcome = self.engine.apply_desired();
                let _ = reply.send(outcome);
            }
            EngineMessage::SuppressionExpired { generation } => {
                self.engine.on_suppression_expired(generation);
            }
            EngineMessage::Status { reply } => {
                let status = EngineStatus {
                    phase,
                    desired: self.engine.desired(),
                    suppressed: self.engine.is_suppressed(),
                    live: self.engine.live(),
                };
                let _ = reply.send(status);
            }
            EngineMessage::Shutdown => {
                info!("engine shutting down");
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }

    fn set_phase(&self, phase: StartupPhase) {
        let previous = self.phase.send_replace(phase);
        if previous != phase {
            debug!(from = previous.as_str(), to = phase.as_str(), "startup phase changed");
        }
    }
}
