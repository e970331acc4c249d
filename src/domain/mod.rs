//! Domain layer for togglekeeper
//!
//! This module contains the toggle state model, the DOM boundary types and
//! the port traits the engine depends on.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{DomainResult, ToggleError};
