use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::DesiredState;

/// Repository trait for the persisted desired state
///
/// Values are keyed by a single fixed identifier and survive page reloads.
/// On the wire a value is one of `"on"` / `"off"`.
///
/// Callers never retry: a failed write leaves the in-memory state
/// authoritative for the rest of the session.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Read the stored state
    ///
    /// Returns `Ok(None)` when nothing has been stored under `key` yet.
    ///
    /// # Errors
    /// Returns `PersistenceFailure` if the backend cannot be read, or
    /// `InvalidStoredValue` if the stored value is neither "on" nor "off".
    async fn get(&self, key: &str) -> DomainResult<Option<DesiredState>>;

    /// Store `state` under `key`, replacing any previous value
    async fn set(&self, key: &str, state: DesiredState) -> DomainResult<()>;

    /// Remove the value stored under `key`, if any
    async fn clear(&self, key: &str) -> DomainResult<()>;
}
