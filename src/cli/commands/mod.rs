pub mod simulate;
pub mod state;
