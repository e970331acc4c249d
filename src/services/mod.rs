pub mod change_watcher;
pub mod click_binder;
pub mod engine_runtime;
pub mod page_event_router;
pub mod persistence;
pub mod reconciliation_engine;
pub mod suppression;

pub use change_watcher::{is_relevant_batch, ChangeWatcher};
pub use click_binder::ClickBinder;
pub use engine_runtime::{EngineHandle, EngineMessage, EngineRuntime, EngineStatus, StartupPhase};
pub use page_event_router::PageEventRouter;
pub use persistence::{load_desired, PersistenceWriter};
pub use reconciliation_engine::{Reconciliation, ReconciliationEngine};
pub use suppression::SuppressionWindow;
