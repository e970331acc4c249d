//! Infrastructure layer module
//!
//! This module contains the adapters behind the domain ports and the
//! process-level plumbing:
//! - State stores (in-memory, JSON file)
//! - Simulated host page
//! - Configuration management
//! - Logging infrastructure
//!
//! Infrastructure implementations satisfy the port traits defined in the domain layer.

pub mod config;
pub mod logging;
pub mod page;
pub mod store;
