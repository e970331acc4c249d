//! In-memory state store.
//!
//! Backs tests and the simulator. Values are kept as raw strings so invalid
//! stored values and write failures can be reproduced.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::domain::errors::{DomainResult, ToggleError};
use crate::domain::models::DesiredState;
use crate::domain::ports::StateStore;

#[derive(Debug, Default)]
pub struct InMemoryStateStore {
    values: Mutex<HashMap<String, String>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, state: DesiredState) -> Self {
        let store = Self::new();
        store.seed(key, state);
        store
    }

    /// Store a value without counting it as a write.
    pub fn seed(&self, key: &str, state: DesiredState) {
        self.insert_raw(key, state.as_str());
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.lock().insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `set` calls, failed ones included.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        // A poisoned map is still a valid map.
        self.values.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn get(&self, key: &str) -> DomainResult<Option<DesiredState>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ToggleError::PersistenceFailure("storage read failed".to_string()));
        }

        let Some(raw) = self.raw(key) else {
            return Ok(None);
        };
        raw.parse().map(Some).map_err(|_| ToggleError::InvalidStoredValue {
            key: key.to_string(),
            value: raw,
        })
    }

    async fn set(&self, key: &str, state: DesiredState) -> DomainResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ToggleError::PersistenceFailure("storage write failed".to_string()));
        }

        self.insert_raw(key, state.as_str());
        Ok(())
    }

    async fn clear(&self, key: &str) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ToggleError::PersistenceFailure("storage write failed".to_string()));
        }

        self.lock().remove(key);
        Ok(())
    }
}
