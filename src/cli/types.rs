//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use super::commands::simulate::SimulateArgs;
use super::commands::state::StateArgs;

#[derive(Parser, Debug)]
#[command(name = "togglekeeper")]
#[command(about = "Keeps a two-state page control at the state the user last chose", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file, used instead of .togglekeeper/config.yaml
    #[arg(short, long, global = true, env = "TOGGLEKEEPER_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a scripted scenario against a simulated page
    Simulate(SimulateArgs),

    /// Inspect or edit the persisted desired state
    State(StateArgs),
}
