//! togglekeeper - keeps a two-state page control at the state the user last chose
//!
//! A host page renders one of two mutually exclusive controls ("Enable
//! search" / "Disable search") and keeps re-rendering them on its own. This
//! crate remembers the state the user last picked by hand, restores it when
//! the page loads, and puts it back when the page silently turns the feature
//! off again.
//!
//! # Architecture
//!
//! This crate follows Clean Architecture / Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): States, DOM boundary types and the port traits
//! - **Service Layer** (`services`): Reconciliation engine, its runtime, the
//!   click binder and the change watcher
//! - **Application Layer** (`application`): Wiring one page to one engine
//! - **Infrastructure Layer** (`infrastructure`): Stores, simulated page,
//!   configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface

/// Wiring of a page, a store and the engine into one running keeper
pub mod application;
/// Command-line interface
pub mod cli;
/// States, DOM boundary types, errors and port traits
pub mod domain;
/// Store, page, configuration and logging adapters
pub mod infrastructure;
/// Reconciliation engine and the tasks around it
pub mod services;

// Re-export commonly used types for convenience
pub use application::Keeper;
pub use domain::models::{Config, ControlKind, DesiredState, LiveState};
pub use domain::ports::{ControlSurface, PageEventSource, StateStore};
pub use domain::{DomainResult, ToggleError};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{EngineHandle, Reconciliation, StartupPhase};
