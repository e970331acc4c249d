//! Routes the host page's ordered event stream to the click binder and the
//! change watcher.
//!
//! Clicks and mutation batches arrive on one stream in the order they
//! happened. A click is forwarded to the engine mailbox before the next
//! event is even looked at, so the engine always sees a user action before
//! any drift check caused by the mutations that click produced.

use tokio::sync::mpsc;
use tracing::debug;

use super::change_watcher::ChangeWatcher;
use super::click_binder::ClickBinder;
use crate::domain::models::PageEvent;

/// Dispatches page events in arrival order.
pub struct PageEventRouter {
    binder: ClickBinder,
    watcher: ChangeWatcher,
}

impl PageEventRouter {
    pub fn new(binder: ClickBinder, watcher: ChangeWatcher) -> Self {
        Self { binder, watcher }
    }

    /// Hand one event to the binder or the watcher.
    pub fn route(&self, event: &PageEvent) {
        match event {
            PageEvent::Click(click) => {
                self.binder.on_click(click);
            }
            PageEvent::Mutations(batch) => {
                self.watcher.observe(batch);
            }
        }
    }

    /// Route events until the page closes the stream.
    pub async fn run(self, mut events: mpsc::UnboundedReceiver<PageEvent>) {
        while let Some(event) = events.recv().await {
            self.route(&event);
        }
        debug!("page event stream closed");
    }
}
