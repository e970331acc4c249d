//! Turns user clicks on either control into engine user actions.

use tracing::{info, trace, warn};

use super::engine_runtime::EngineHandle;
use crate::domain::models::{ClickEvent, ControlSelectors, DesiredState};

/// Capture-phase click listener for both controls.
pub struct ClickBinder {
    selectors: ControlSelectors,
    engine: EngineHandle,
}

impl ClickBinder {
    pub fn new(selectors: ControlSelectors, engine: EngineHandle) -> Self {
        Self { selectors, engine }
    }

    /// Handle one click seen in the capture phase.
    ///
    /// The label is read before the page reacts, so clicking "enable" means
    /// the state after the click is on. Returns the state reported to the
    /// engine, if the click was a user click on one of the controls.
    pub fn on_click(&self, event: &ClickEvent) -> Option<DesiredState> {
        if !event.trusted {
            trace!("ignoring synthetic click");
            return None;
        }

        let control = self.selectors.closest(&event.path)?;
        let state_after_click = control.target_state();
        info!(control = %control, desired = %state_after_click, "user manually clicked the toggle");

        if let Err(err) = self.engine.user_action(state_after_click) {
            warn!(error = %err, "could not report user action");
        }
        Some(state_after_click)
    }
}
