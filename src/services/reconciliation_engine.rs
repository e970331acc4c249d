//! Desired-state reconciliation engine.
//!
//! Owns the user's desired state and the manual-override suppression
//! window, and decides when a corrective click is needed. The engine is
//! driven exclusively from its runtime task (see `engine_runtime`), so its
//! state is never touched concurrently.
//!
//! Drift correction is asymmetric: `on_external_change` only
//! ever re-enables the control while the user wants it on. A page turning
//! the control on while the user wants it off is left alone.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::engine_runtime::EngineMessage;
use super::persistence::PersistenceWriter;
use super::suppression::SuppressionWindow;
use crate::domain::models::{ControlKind, DesiredState, LiveState, TimingConfig};
use crate::domain::ports::ControlSurface;

/// What a reconciliation step decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "control", rename_all = "snake_case")]
pub enum Reconciliation {
    /// A corrective click was issued on this control.
    Clicked(ControlKind),
    /// Live state already matches; nothing to do.
    InSync,
    /// The control is not rendered (or is ambiguous); skipped this cycle.
    ControlMissing,
    /// A user action happened too recently; skipped this cycle.
    Suppressed,
    /// Desired state is off, which is never enforced automatically.
    NotEnforced,
    /// The click could not be delivered.
    ClickFailed,
}

impl Reconciliation {
    pub const fn clicked(&self) -> Option<ControlKind> {
        match self {
            Self::Clicked(control) => Some(*control),
            _ => None,
        }
    }
}

pub struct ReconciliationEngine {
    surface: Arc<dyn ControlSurface>,
    persistence: PersistenceWriter,
    timing: TimingConfig,
    mailbox: mpsc::UnboundedSender<EngineMessage>,
    desired: DesiredState,
    suppression: SuppressionWindow,
}

impl ReconciliationEngine {
    pub fn new(
        surface: Arc<dyn ControlSurface>,
        persistence: PersistenceWriter,
        timing: TimingConfig,
        mailbox: mpsc::UnboundedSender<EngineMessage>,
    ) -> Self {
        Self {
            surface,
            persistence,
            timing,
            mailbox,
            desired: DesiredState::default(),
            suppression: SuppressionWindow::new(),
        }
    }

    pub const fn desired(&self) -> DesiredState {
        self.desired
    }

    pub const fn is_suppressed(&self) -> bool {
        self.suppression.is_active()
    }

    /// Live state as the locator sees it right now.
    pub fn live(&self) -> LiveState {
        self.surface.locate()
    }

    /// Adopt the stored state, or the default when nothing was stored.
    /// Does not touch the DOM.
    pub fn initialize(&mut self, loaded: Option<DesiredState>) {
        self.desired = loaded.unwrap_or_default();
        info!(desired = %self.desired, from_storage = loaded.is_some(), "desired state initialized");
    }

    /// Click whichever control moves the live state to the desired state.
    ///
    /// Idempotent: once live matches desired, further calls are no-ops.
    pub fn apply_desired(&self) -> Reconciliation {
        let live = self.surface.locate();
        if live == LiveState::Absent {
            info!(desired = %self.desired, "control not found, cannot apply desired state");
            return Reconciliation::ControlMissing;
        }

        if self.desired.is_satisfied_by(live) {
            debug!(desired = %self.desired, "control already in desired state");
            return Reconciliation::InSync;
        }

        info!(live = %live, desired = %self.desired, "live state differs from desired, clicking");
        self.click(self.desired.control_to_reach())
    }

    /// Record a genuine user toggle.
    ///
    /// The observed state is taken as-is, persisted in the background, and
    /// reconciliation is suppressed for the configured window.
    pub fn on_user_action(&mut self, observed: DesiredState) {
        let previous = self.desired;
        self.desired = observed;
        self.persistence.persist(observed);

        let generation = self.suppression.start(
            self.timing.suppression_window(),
            self.mailbox.clone(),
            |generation| EngineMessage::SuppressionExpired { generation },
        );

        info!(
            previous = %previous,
            desired = %observed,
            generation,
            "user toggled the control, suppressing reconciliation"
        );
    }

    /// React to a relevant DOM change reported by the watcher.
    pub fn on_external_change(&self) -> Reconciliation {
        if self.suppression.is_active() {
            debug!("ignoring external change during manual override window");
            return Reconciliation::Suppressed;
        }

        if self.desired == DesiredState::Off {
            return Reconciliation::NotEnforced;
        }

        match self.surface.locate() {
            LiveState::Off => {
                info!("page turned the control off while desired is on, re-enabling");
                // Straight to the enable control; apply_desired is the
                // startup path and must not run from the watcher.
                self.click(ControlKind::Enable)
            }
            LiveState::On => Reconciliation::InSync,
            LiveState::Absent => {
                info!(desired = %self.desired, "control not found after external change");
                Reconciliation::ControlMissing
            }
        }
    }

    /// Close the suppression window if `generation` is still current.
    pub fn on_suppression_expired(&mut self, generation: u64) {
        if self.suppression.expire(generation) {
            debug!(desired = %self.desired, "manual override window reset");
        }
    }

    fn click(&self, control: ControlKind) -> Reconciliation {
        match self.surface.click(control) {
            Ok(()) => Reconciliation::Clicked(control),
            Err(err) => {
                warn!(control = %control, error = %err, "could not click control");
                Reconciliation::ClickFailed
            }
        }
    }
}
