//! Host page adapters.

pub mod simulated;

pub use simulated::SimulatedPage;
