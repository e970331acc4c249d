use tracing::warn;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ControlKind, ControlSnapshot, LiveState};

/// Read-only view of which control the page currently renders.
///
/// Implementations must be cheap and side-effect free; the engine calls
/// `snapshot` before the page has finished rendering and after every
/// relevant mutation batch.
pub trait ControlLocator: Send + Sync {
    /// Which of the two controls is present right now.
    fn snapshot(&self) -> ControlSnapshot;

    /// Live state of the control. An ambiguous snapshot (both controls
    /// present) is reported as `Absent` because no safe decision exists.
    fn locate(&self) -> LiveState {
        let snapshot = self.snapshot();
        match snapshot.live_state() {
            Ok(live) => live,
            Err(err) => {
                warn!(
                    error = %err,
                    enable_present = snapshot.enable_present,
                    disable_present = snapshot.disable_present,
                    "treating control as absent"
                );
                LiveState::Absent
            }
        }
    }
}

/// Synthesises a click on one of the two controls.
pub trait ControlActuator: Send + Sync {
    /// Fails with `ControlNotFound` if `control` is not rendered.
    fn click(&self, control: ControlKind) -> DomainResult<()>;
}

/// Everything the engine needs from the page's DOM.
pub trait ControlSurface: ControlLocator + ControlActuator {}

impl<T: ControlLocator + ControlActuator + ?Sized> ControlSurface for T {}
