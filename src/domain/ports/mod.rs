//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines the interfaces the reconciliation engine depends on:
//! - ControlLocator / ControlActuator: DOM query and click boundary
//! - StateStore: persisted desired state
//! - PageEventSource: ordered click and mutation feed from the host page
//!
//! Concrete adapters live in the infrastructure layer, so the engine can be
//! driven by a real page bridge or by test doubles.

pub mod control_surface;
pub mod null_state_store;
pub mod page_events;
pub mod state_store;

pub use control_surface::{ControlActuator, ControlLocator, ControlSurface};
pub use null_state_store::NullStateStore;
pub use page_events::PageEventSource;
pub use state_store::StateStore;
