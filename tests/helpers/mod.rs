//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use togglekeeper::domain::models::{Config, ControlSelectors, DesiredState, LiveState};
use togglekeeper::domain::ports::StateStore;
use togglekeeper::domain::DomainResult;
use togglekeeper::infrastructure::page::SimulatedPage;
use togglekeeper::infrastructure::store::InMemoryStateStore;
use togglekeeper::Keeper;

pub const KEY: &str = "t3SearchManualState";

pub struct Harness {
    pub config: Config,
    pub page: Arc<SimulatedPage>,
    pub store: Arc<InMemoryStateStore>,
    pub keeper: Keeper,
}

impl Harness {
    pub fn start(live: LiveState, stored: Option<DesiredState>) -> Self {
        let store = Arc::new(InMemoryStateStore::new());
        if let Some(state) = stored {
            store.seed(KEY, state);
        }
        Self::start_with_store(live, store)
    }

    pub fn start_with_store(live: LiveState, store: Arc<InMemoryStateStore>) -> Self {
        let config = Config::default();
        let page = Arc::new(SimulatedPage::new(ControlSelectors::default(), live));
        let keeper = Keeper::start(page.clone(), store.clone(), &config);
        Self {
            config,
            page,
            store,
            keeper,
        }
    }

    /// Start and wait until the initial apply has run.
    pub async fn observing(live: LiveState, stored: Option<DesiredState>) -> Self {
        let harness = Self::start(live, stored);
        harness.keeper.engine().wait_until_observing().await.unwrap();
        harness
    }

    pub async fn desired(&self) -> DesiredState {
        self.keeper.status().await.unwrap().desired
    }
}

pub async fn advance_ms(ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

/// Store whose reads take `delay`, to exercise clicks made during loading.
pub struct SlowStore {
    inner: InMemoryStateStore,
    delay: Duration,
}

impl SlowStore {
    pub fn new(inner: InMemoryStateStore, delay: Duration) -> Self {
        Self { inner, delay }
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.raw(key)
    }
}

#[async_trait]
impl StateStore for SlowStore {
    async fn get(&self, key: &str) -> DomainResult<Option<DesiredState>> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, state: DesiredState) -> DomainResult<()> {
        self.inner.set(key, state).await
    }

    async fn clear(&self, key: &str) -> DomainResult<()> {
        self.inner.clear(key).await
    }
}
