//! In-process stand-in for the host page.
//!
//! Renders at most one of the two controls (or both, to reproduce a broken
//! page), answers DOM queries, accepts synthesised clicks and publishes the
//! click events and mutation batches a real page would produce:
//!
//! - a user click is published to capture listeners first, then the page
//!   re-renders and publishes the resulting mutations;
//! - flipping between the two controls relabels the button in place
//!   (an attribute mutation), while appearing or disappearing is a
//!   child-list mutation;
//! - subscribers only see events published after they subscribed.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::mpsc;
use tracing::trace;

use crate::domain::errors::{DomainResult, ToggleError};
use crate::domain::models::{
    ClickEvent, ControlKind, ControlSelectors, ControlSnapshot, DomNode, LiveState,
    MutationRecord, PageEvent,
};
use crate::domain::ports::{ControlActuator, ControlLocator, PageEventSource};

pub struct SimulatedPage {
    selectors: ControlSelectors,
    inner: Mutex<PageInner>,
}

struct PageInner {
    snapshot: ControlSnapshot,
    subscribers: Vec<mpsc::UnboundedSender<PageEvent>>,
    synthesized_clicks: Vec<ControlKind>,
}

impl PageInner {
    fn publish(&mut self, event: &PageEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }
}

impl SimulatedPage {
    pub fn new(selectors: ControlSelectors, initial: LiveState) -> Self {
        Self {
            selectors,
            inner: Mutex::new(PageInner {
                snapshot: ControlSnapshot::rendering(initial),
                subscribers: Vec::new(),
                synthesized_clicks: Vec::new(),
            }),
        }
    }

    pub const fn selectors(&self) -> &ControlSelectors {
        &self.selectors
    }

    /// Live state, with an ambiguous page reported as absent.
    pub fn live_state(&self) -> LiveState {
        self.locate()
    }

    /// Clicks issued through [`ControlActuator::click`], oldest first.
    pub fn synthesized_clicks(&self) -> Vec<ControlKind> {
        self.lock().synthesized_clicks.clone()
    }

    /// A person clicks `control`.
    pub fn user_click(&self, control: ControlKind) -> DomainResult<()> {
        self.dispatch_click(control, true)
    }

    /// The page re-renders the control on its own.
    pub fn host_render(&self, live: LiveState) {
        let mut inner = self.lock();
        self.render(&mut inner, ControlSnapshot::rendering(live));
    }

    /// The page renders both controls at once, breaking mutual exclusivity.
    pub fn render_both(&self) {
        let mut inner = self.lock();
        self.render(
            &mut inner,
            ControlSnapshot {
                enable_present: true,
                disable_present: true,
            },
        );
    }

    /// Publish DOM churn unrelated to the control.
    pub fn noise(&self) {
        let batch = vec![
            MutationRecord::ChildList {
                added: vec![DomNode::element("div"), DomNode::text()],
                removed: vec![],
            },
            MutationRecord::Attributes {
                target: DomNode::element("div"),
                attribute: "class".to_string(),
            },
        ];
        self.lock().publish(&PageEvent::Mutations(batch));
    }

    fn dispatch_click(&self, control: ControlKind, trusted: bool) -> DomainResult<()> {
        let mut inner = self.lock();
        if !inner.snapshot.contains(control) {
            return Err(ToggleError::ControlNotFound(self.selectors.label_for(control).to_string()));
        }

        if !trusted {
            inner.synthesized_clicks.push(control);
        }

        // Capture listeners see the click while the label is still the old one.
        let click = ClickEvent {
            path: vec![
                DomNode::element("svg"),
                self.selectors.node_for(control),
                DomNode::element("body"),
            ],
            trusted,
        };
        inner.publish(&PageEvent::Click(click));

        let next = ControlSnapshot::rendering(control.target_state().into());
        self.render(&mut inner, next);
        Ok(())
    }

    fn render(&self, inner: &mut PageInner, next: ControlSnapshot) {
        let previous = inner.snapshot;
        if previous == next {
            return;
        }
        inner.snapshot = next;

        let batch = self.mutations_between(previous, next);
        trace!(records = batch.len(), "page re-rendered");
        inner.publish(&PageEvent::Mutations(batch));
    }

    fn mutations_between(&self, previous: ControlSnapshot, next: ControlSnapshot) -> Vec<MutationRecord> {
        let was = rendered_controls(previous);
        let now = rendered_controls(next);

        // One control swapped for the other: the button is relabelled in place.
        if let ([before], [after]) = (was.as_slice(), now.as_slice()) {
            if before != after {
                return vec![MutationRecord::Attributes {
                    target: self.selectors.node_for(*after),
                    attribute: self.selectors.label_attribute.clone(),
                }];
            }
        }

        let added: Vec<DomNode> = now
            .iter()
            .filter(|c| !was.contains(c))
            .map(|c| self.selectors.node_for(*c))
            .collect();
        let removed: Vec<DomNode> = was
            .iter()
            .filter(|c| !now.contains(c))
            .map(|c| self.selectors.node_for(*c))
            .collect();
        vec![MutationRecord::ChildList { added, removed }]
    }

    fn lock(&self) -> MutexGuard<'_, PageInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn rendered_controls(snapshot: ControlSnapshot) -> Vec<ControlKind> {
    [ControlKind::Enable, ControlKind::Disable]
        .into_iter()
        .filter(|c| snapshot.contains(*c))
        .collect()
}

impl ControlLocator for SimulatedPage {
    fn snapshot(&self) -> ControlSnapshot {
        self.lock().snapshot
    }
}

impl ControlActuator for SimulatedPage {
    fn click(&self, control: ControlKind) -> DomainResult<()> {
        self.dispatch_click(control, false)
    }
}

impl PageEventSource for SimulatedPage {
    fn subscribe(&self) -> mpsc::UnboundedReceiver<PageEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.lock().subscribers.push(tx);
        rx
    }
}
