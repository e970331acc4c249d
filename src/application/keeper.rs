use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::errors::DomainResult;
use crate::domain::models::{Config, ControlSelectors};
use crate::domain::ports::{ControlSurface, PageEventSource, StateStore};
use crate::services::{
    ChangeWatcher, ClickBinder, EngineHandle, EngineRuntime, EngineStatus, PageEventRouter,
};

/// Wires one host page to one reconciliation engine.
///
/// Starting a `Keeper` does what the content script does on page load:
/// - subscribes to the page's click and mutation stream before anything
///   else, so no user click can be missed;
/// - spawns the engine, which loads the stored choice, waits for the page to
///   settle and applies it once;
/// - spawns the router that feeds clicks to the binder and mutation batches
///   to the watcher.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use togglekeeper::application::Keeper;
/// use togglekeeper::domain::models::{Config, ControlSelectors, LiveState};
/// use togglekeeper::infrastructure::page::SimulatedPage;
/// use togglekeeper::infrastructure::store::InMemoryStateStore;
///
/// # async fn example() -> togglekeeper::domain::DomainResult<()> {
/// let config = Config::default();
/// let page = Arc::new(SimulatedPage::new(ControlSelectors::default(), LiveState::Off));
/// let keeper = Keeper::start(page, Arc::new(InMemoryStateStore::new()), &config);
/// keeper.engine().wait_until_observing().await?;
/// keeper.shutdown().await;
/// # Ok(())
/// # }
/// ```
pub struct Keeper {
    engine: EngineHandle,
    engine_task: JoinHandle<()>,
    router_task: JoinHandle<()>,
}

impl Keeper {
    /// Subscribe to `page`, then spawn the engine and the event router.
    ///
    /// Must be called inside a tokio runtime.
    pub fn start<P>(page: Arc<P>, store: Arc<dyn StateStore>, config: &Config) -> Self
    where
        P: ControlSurface + PageEventSource + 'static,
    {
        let events = page.subscribe();
        let selectors = ControlSelectors::from_config(&config.control);

        let (engine, engine_task) = EngineRuntime::spawn(page, store, config);

        let binder = ClickBinder::new(selectors.clone(), engine.clone());
        let watcher = ChangeWatcher::new(selectors, config.timing.watcher_delay(), engine.clone());
        let router_task = tokio::spawn(PageEventRouter::new(binder, watcher).run(events));

        info!(
            key = %config.storage.key,
            enable = %config.control.enable_label,
            disable = %config.control.disable_label,
            "togglekeeper started"
        );

        Self {
            engine,
            engine_task,
            router_task,
        }
    }

    /// Handle to the running engine.
    pub const fn engine(&self) -> &EngineHandle {
        &self.engine
    }

    /// Current phase, desired state and live state.
    pub async fn status(&self) -> DomainResult<EngineStatus> {
        self.engine.status().await
    }

    /// Stop routing page events and stop the engine.
    ///
    /// Writes already handed to the persistence writer still complete.
    pub async fn shutdown(self) {
        self.router_task.abort();
        if let Err(err) = self.engine.shutdown() {
            debug!(error = %err, "engine already stopped");
        }
        if let Err(err) = self.engine_task.await {
            warn!(error = %err, "engine task ended abnormally");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ControlKind, DesiredState, LiveState};
    use crate::domain::ToggleError;
    use crate::infrastructure::page::SimulatedPage;
    use crate::infrastructure::store::InMemoryStateStore;
    use crate::services::StartupPhase;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn test_start_reaches_observing_and_corrects_drift() {
        let config = Config::default();
        let page = Arc::new(SimulatedPage::new(ControlSelectors::default(), LiveState::Off));
        let store = Arc::new(InMemoryStateStore::with_value(&config.storage.key, DesiredState::On));

        let keeper = Keeper::start(page.clone(), store, &config);
        keeper.engine().wait_until_observing().await.unwrap();
        assert_eq!(page.synthesized_clicks(), vec![ControlKind::Enable]);

        tokio::time::sleep(Duration::from_millis(200)).await;
        page.host_render(LiveState::Off);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(page.live_state(), LiveState::On);
        assert_eq!(
            page.synthesized_clicks(),
            vec![ControlKind::Enable, ControlKind::Enable]
        );

        let status = keeper.status().await.unwrap();
        assert_eq!(status.phase, StartupPhase::Observing);
        keeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_startup_apply_mutations_do_not_click_again() {
        let config = Config::default();
        let page = Arc::new(SimulatedPage::new(ControlSelectors::default(), LiveState::Off));
        let store = Arc::new(InMemoryStateStore::with_value(&config.storage.key, DesiredState::On));

        let keeper = Keeper::start(page.clone(), store, &config);
        keeper.engine().wait_until_observing().await.unwrap();

        // Let any batch from the apply click reach the watcher and its check run.
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(page.live_state(), LiveState::On);
        assert_eq!(page.synthesized_clicks(), vec![ControlKind::Enable]);
        let status = keeper.status().await.unwrap();
        assert_eq!(status.desired, DesiredState::On);
        keeper.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_stops_engine() {
        let config = Config::default();
        let page = Arc::new(SimulatedPage::new(ControlSelectors::default(), LiveState::Off));
        let keeper = Keeper::start(page, Arc::new(InMemoryStateStore::new()), &config);
        let engine = keeper.engine().clone();

        keeper.shutdown().await;
        assert_eq!(engine.status().await, Err(ToggleError::EngineStopped));
    }
}
