//! Null state store implementation.
//!
//! Used when persistence is not wanted but the engine still needs a
//! StateStore implementation.

use async_trait::async_trait;

use super::StateStore;
use crate::domain::errors::DomainResult;
use crate::domain::models::DesiredState;

/// A no-op state store that remembers nothing.
///
/// Every session starts from the default desired state.
#[derive(Debug, Clone, Default)]
pub struct NullStateStore;

impl NullStateStore {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StateStore for NullStateStore {
    async fn get(&self, _key: &str) -> DomainResult<Option<DesiredState>> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _state: DesiredState) -> DomainResult<()> {
        Ok(())
    }

    async fn clear(&self, _key: &str) -> DomainResult<()> {
        Ok(())
    }
}
