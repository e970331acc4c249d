//! togglekeeper CLI entry point.

use anyhow::Result;
use clap::Parser;

use togglekeeper::cli::commands::{simulate, state};
use togglekeeper::cli::{handle_error, Cli, Commands};
use togglekeeper::domain::models::Config;
use togglekeeper::infrastructure::config::ConfigLoader;
use togglekeeper::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            handle_error(&err, cli.json);
            std::process::exit(2);
        }
    };

    let _logger = match LogConfig::from_settings(&config.logging).and_then(|c| LoggerImpl::init(&c)) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Warning: logging disabled: {err:#}");
            None
        }
    };

    let result = match cli.command {
        Commands::Simulate(args) => simulate::execute(args, &config, cli.json).await,
        Commands::State(args) => state::execute(args, &config, cli.json).await,
    };

    if let Err(err) = result {
        handle_error(&err, cli.json);
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}
