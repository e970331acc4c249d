pub mod config;
pub mod dom;
pub mod toggle;

pub use config::{Config, ControlConfig, LoggingConfig, StorageConfig, TimingConfig};
pub use dom::{
    ClickEvent, ControlSelectors, DomNode, MutationBatch, MutationRecord, PageEvent,
};
pub use toggle::{ControlKind, ControlSnapshot, DesiredState, LiveState};
