use tokio::sync::mpsc;

use crate::domain::models::PageEvent;

/// Ordered stream of clicks and mutation batches from the host page.
///
/// A subscription only receives events that happen after `subscribe`
/// returns. Within one subscription, a user click is delivered before any
/// mutation batch the page produces in response to it, which is what a
/// capturing click listener observes in a browser.
pub trait PageEventSource: Send + Sync {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<PageEvent>;
}
