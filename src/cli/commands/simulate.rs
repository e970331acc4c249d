//! Scenario replay against a simulated page.
//!
//! A scenario is a YAML document:
//!
//! ```yaml
//! initial: off        # on | off | absent | both
//! stored: on          # optional; seeds an in-memory store instead of the state file
//! steps:
//!   - wait_ms: 600
//!   - user_click: disable
//!   - host_render: on
//!   - noise
//! ```
//!
//! Without `stored`, the engine reads and writes the state file at
//! `storage.path`, the same file `togglekeeper state` edits.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::application::Keeper;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, ControlKind, ControlSelectors, DesiredState, LiveState};
use crate::domain::ports::{NullStateStore, StateStore};
use crate::infrastructure::page::SimulatedPage;
use crate::infrastructure::store::{InMemoryStateStore, JsonFileStateStore};
use crate::services::StartupPhase;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Scenario file (YAML)
    pub scenario: PathBuf,

    /// Where the desired state is kept while the scenario runs
    #[arg(long, value_enum, default_value_t = StoreKind::File)]
    pub store: StoreKind,
}

/// State store backing a simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    /// The JSON state file at `storage.path`
    File,
    /// A fresh in-memory store, seeded from the scenario's `stored`
    Memory,
    /// Nothing is remembered; `stored` is ignored
    Null,
}

/// How the page renders the control when the scenario starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InitialRender {
    On,
    #[default]
    Off,
    Absent,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    WaitMs(u64),
    UserClick(ControlKind),
    HostRender(LiveState),
    RenderBoth,
    Noise,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub initial: InitialRender,
    /// Raw stored value, so invalid values can be replayed too.
    #[serde(default)]
    pub stored: Option<String>,
    /// Steps are written as `- wait_ms: 600` rather than YAML tags.
    #[serde(default, with = "serde_yaml::with::singleton_map_recursive")]
    pub steps: Vec<Step>,
}

impl Scenario {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Invalid scenario")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scenario {}", path.display()))?;
        Self::from_yaml(&yaml).with_context(|| format!("In {}", path.display()))
    }
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub phase: StartupPhase,
    pub desired: DesiredState,
    pub live: LiveState,
    pub stored: Option<String>,
    pub corrective_clicks: Vec<ControlKind>,
}

impl CommandOutput for SimulationReport {
    fn to_human(&self) -> String {
        let clicks = if self.corrective_clicks.is_empty() {
            "none".to_string()
        } else {
            self.corrective_clicks
                .iter()
                .map(ControlKind::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };
        [
            format!("Phase:             {}", self.phase.as_str()),
            format!("Desired:           {}", self.desired),
            format!("Live:              {}", self.live),
            format!("Stored:            {}", self.stored.as_deref().unwrap_or("(not set)")),
            format!("Corrective clicks: {clicks}"),
        ]
        .join("\n")
    }
}

/// Run `scenario` to completion against an in-memory store and report
/// where it ended up.
pub async fn run_scenario(scenario: &Scenario, config: &Config) -> Result<SimulationReport> {
    let store = Arc::new(InMemoryStateStore::new());
    if let Some(raw) = &scenario.stored {
        store.insert_raw(&config.storage.key, raw);
    }
    let mut report = replay(scenario, config, store.clone()).await?;
    report.stored = store.raw(&config.storage.key);
    Ok(report)
}

/// Run `scenario` against the JSON state file at `storage.path`.
pub async fn run_scenario_with_file(
    scenario: &Scenario,
    config: &Config,
) -> Result<SimulationReport> {
    let store = Arc::new(JsonFileStateStore::new(&config.storage.path));
    let mut report = replay(scenario, config, store.clone()).await?;
    let entries = store
        .entries()
        .await
        .with_context(|| format!("Failed to read {}", store.path().display()))?;
    report.stored = entries.get(&config.storage.key).cloned();
    Ok(report)
}

/// Run `scenario` with nothing remembered between or during sessions.
pub async fn run_scenario_without_storage(
    scenario: &Scenario,
    config: &Config,
) -> Result<SimulationReport> {
    replay(scenario, config, Arc::new(NullStateStore::new())).await
}

async fn replay(
    scenario: &Scenario,
    config: &Config,
    store: Arc<dyn StateStore>,
) -> Result<SimulationReport> {
    let selectors = ControlSelectors::from_config(&config.control);
    let initial = match scenario.initial {
        InitialRender::On => LiveState::On,
        InitialRender::Off => LiveState::Off,
        InitialRender::Absent | InitialRender::Both => LiveState::Absent,
    };
    let page = Arc::new(SimulatedPage::new(selectors, initial));
    if scenario.initial == InitialRender::Both {
        page.render_both();
    }

    let keeper = Keeper::start(page.clone(), store, config);

    for (index, step) in scenario.steps.iter().enumerate() {
        debug!(step = index, ?step, "replaying step");
        match step {
            Step::WaitMs(ms) => tokio::time::sleep(Duration::from_millis(*ms)).await,
            Step::UserClick(control) => {
                if let Err(err) = page.user_click(*control) {
                    warn!(step = index, error = %err, "user click had no target");
                }
            }
            Step::HostRender(live) => page.host_render(*live),
            Step::RenderBoth => page.render_both(),
            Step::Noise => page.noise(),
        }
        // Let the page's events reach the router before the next step.
        tokio::task::yield_now().await;
    }

    // Pending drift checks land within one watcher delay.
    tokio::time::sleep(config.timing.watcher_delay() * 2).await;

    let status = keeper.status().await.context("Engine stopped unexpectedly")?;
    keeper.shutdown().await;

    let report = SimulationReport {
        phase: status.phase,
        desired: status.desired,
        live: page.live_state(),
        stored: None,
        corrective_clicks: page.synthesized_clicks(),
    };
    info!(
        desired = %report.desired,
        live = %report.live,
        clicks = report.corrective_clicks.len(),
        "scenario finished"
    );
    Ok(report)
}

pub async fn execute(args: SimulateArgs, config: &Config, json_mode: bool) -> Result<()> {
    let scenario = Scenario::from_file(&args.scenario)?;
    let store = match (args.store, &scenario.stored) {
        (StoreKind::File, Some(_)) => {
            info!("scenario seeds a stored value, using an in-memory store");
            StoreKind::Memory
        }
        (kind, _) => kind,
    };
    let report = match store {
        StoreKind::File => run_scenario_with_file(&scenario, config).await?,
        StoreKind::Memory => run_scenario(&scenario, config).await?,
        StoreKind::Null => run_scenario_without_storage(&scenario, config).await?,
    };
    output(&report, json_mode);
    Ok(())
}
