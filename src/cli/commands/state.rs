//! Persisted-state CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, DesiredState};
use crate::domain::ports::StateStore;
use crate::infrastructure::store::JsonFileStateStore;

#[derive(Args, Debug)]
pub struct StateArgs {
    #[command(subcommand)]
    pub command: StateCommands,

    /// Storage key, overriding `storage.key`
    #[arg(short, long, global = true)]
    pub key: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum StateCommands {
    /// Show the stored desired state
    Show,
    /// Store a desired state
    Set {
        /// `on` or `off`
        state: DesiredState,
    },
    /// Remove the stored desired state
    Clear,
}

#[derive(Debug, Serialize)]
pub struct StateOutput {
    pub path: String,
    pub key: String,
    /// Raw stored value, if any.
    pub stored: Option<String>,
    /// State the engine would start with.
    pub effective: DesiredState,
    pub valid: bool,
}

impl CommandOutput for StateOutput {
    fn to_human(&self) -> String {
        let stored = match (&self.stored, self.valid) {
            (None, _) => "(not set)".to_string(),
            (Some(raw), true) => raw.clone(),
            (Some(raw), false) => format!("{raw:?} (invalid, ignored)"),
        };
        [
            format!("Store:     {}", self.path),
            format!("Key:       {}", self.key),
            format!("Stored:    {stored}"),
            format!("Effective: {}", self.effective),
        ]
        .join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct StateActionOutput {
    pub success: bool,
    pub message: String,
}

impl CommandOutput for StateActionOutput {
    fn to_human(&self) -> String {
        self.message.clone()
    }
}

pub async fn execute(args: StateArgs, config: &Config, json_mode: bool) -> Result<()> {
    let store = JsonFileStateStore::new(&config.storage.path);
    let key = args.key.unwrap_or_else(|| config.storage.key.clone());

    match args.command {
        StateCommands::Show => {
            let entries = store
                .entries()
                .await
                .with_context(|| format!("Failed to read {}", store.path().display()))?;
            let stored = entries.get(&key).cloned();
            let parsed = stored.as_deref().map(str::parse::<DesiredState>);

            let out = StateOutput {
                path: store.path().display().to_string(),
                key,
                valid: !matches!(parsed, Some(Err(_))),
                effective: parsed.and_then(Result::ok).unwrap_or_default(),
                stored,
            };
            output(&out, json_mode);
        }

        StateCommands::Set { state } => {
            store
                .set(&key, state)
                .await
                .with_context(|| format!("Failed to write {}", store.path().display()))?;

            let out = StateActionOutput {
                success: true,
                message: format!("Stored {key} = {state}"),
            };
            output(&out, json_mode);
        }

        StateCommands::Clear => {
            store
                .clear(&key)
                .await
                .with_context(|| format!("Failed to write {}", store.path().display()))?;

            let out = StateActionOutput {
                success: true,
                message: format!("Cleared {key}"),
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.path = dir.path().join("state.json").display().to_string();
        config
    }

    #[tokio::test]
    async fn test_set_then_clear() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);
        let store = JsonFileStateStore::new(&config.storage.path);

        let set = StateArgs {
            command: StateCommands::Set {
                state: DesiredState::On,
            },
            key: None,
        };
        execute(set, &config, true).await.unwrap();
        assert_eq!(
            store.get(&config.storage.key).await.unwrap(),
            Some(DesiredState::On)
        );

        let clear = StateArgs {
            command: StateCommands::Clear,
            key: None,
        };
        execute(clear, &config, true).await.unwrap();
        assert_eq!(store.get(&config.storage.key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_key_override() {
        let dir = TempDir::new().unwrap();
        let config = config_in(&dir);

        let set = StateArgs {
            command: StateCommands::Set {
                state: DesiredState::Off,
            },
            key: Some("other".to_string()),
        };
        execute(set, &config, false).await.unwrap();

        let store = JsonFileStateStore::new(&config.storage.path);
        assert_eq!(store.get("other").await.unwrap(), Some(DesiredState::Off));
        assert_eq!(store.get(&config.storage.key).await.unwrap(), None);
    }

    #[test]
    fn test_invalid_value_is_flagged() {
        let out = StateOutput {
            path: "state.json".to_string(),
            key: "k".to_string(),
            stored: Some("enabled".to_string()),
            effective: DesiredState::Off,
            valid: false,
        };
        assert!(out.to_human().contains("invalid, ignored"));
    }
}
