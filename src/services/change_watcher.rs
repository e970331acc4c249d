//! Mutation-batch filter in front of the reconciliation engine.
//!
//! The host page mutates its DOM constantly; only batches that could have
//! changed which control is rendered reach the engine. A relevant batch
//! schedules a drift check after `watcher_delay`, which is the timing
//! contract that keeps the watcher behind a same-tick user click.

use std::time::Duration;

use tracing::{debug, trace, warn};

use super::engine_runtime::EngineHandle;
use crate::domain::models::{ControlSelectors, MutationRecord};

/// Filters mutation batches and schedules drift checks on the engine.
pub struct ChangeWatcher {
    selectors: ControlSelectors,
    delay: Duration,
    engine: EngineHandle,
}

impl ChangeWatcher {
    /// Watcher that reports relevant batches to `engine` after `delay`.
    pub fn new(selectors: ControlSelectors, delay: Duration, engine: EngineHandle) -> Self {
        Self {
            selectors,
            delay,
            engine,
        }
    }

    /// True if any record could have changed the control's rendered state.
    pub fn is_relevant(&self, batch: &[MutationRecord]) -> bool {
        is_relevant_batch(&self.selectors, batch)
    }

    /// Feed one batch from the page. Returns true if a drift check was scheduled.
    ///
    /// Batches are discarded until the engine has finished startup, which is
    /// the same as not being subscribed yet.
    ///
    /// The phase is read when the router hands the batch over, not when the
    /// page produced it. Mutations caused by the startup apply click can
    /// therefore arrive after the engine reached `Observing` and schedule one
    /// drift check. That check finds the control already in the desired state
    /// and clicks nothing.
    pub fn observe(&self, batch: &[MutationRecord]) -> bool {
        if !self.engine.is_observing() {
            trace!(records = batch.len(), "watcher not started, discarding mutations");
            return false;
        }

        if !self.is_relevant(batch) {
            trace!(records = batch.len(), "irrelevant mutation batch");
            return false;
        }

        debug!(
            records = batch.len(),
            delay_ms = self.delay.as_millis(),
            "control may have changed, scheduling drift check"
        );
        let engine = self.engine.clone();
        let delay = self.delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Err(err) = engine.external_change() {
                warn!(error = %err, "could not report external change");
            }
        });
        true
    }
}

/// Relevance rule shared by the watcher and its tests.
///
/// A batch matters iff some record is a label-attribute change on an element
/// of the controls' element type, or a child-list change that adds or removes
/// a node matching either control's selector.
pub fn is_relevant_batch(selectors: &ControlSelectors, batch: &[MutationRecord]) -> bool {
    batch.iter().any(|record| match record {
        MutationRecord::Attributes { target, attribute } => {
            *attribute == selectors.label_attribute && target.has_tag(&selectors.element)
        }
        MutationRecord::ChildList { added, removed } => added
            .iter()
            .chain(removed)
            .any(|node| selectors.matches_any(node)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{ControlKind, DomNode};

    fn selectors() -> ControlSelectors {
        ControlSelectors::default()
    }

    #[test]
    fn test_label_change_on_button_is_relevant() {
        let batch = vec![MutationRecord::Attributes {
            target: DomNode::element("button").with_attribute("aria-label", "Something else"),
            attribute: "aria-label".to_string(),
        }];
        assert!(is_relevant_batch(&selectors(), &batch));
    }

    #[test]
    fn test_label_change_on_other_element_is_ignored() {
        let batch = vec![MutationRecord::Attributes {
            target: DomNode::element("div").with_attribute("aria-label", "Enable search"),
            attribute: "aria-label".to_string(),
        }];
        assert!(!is_relevant_batch(&selectors(), &batch));
    }

    #[test]
    fn test_other_attribute_on_button_is_ignored() {
        let batch = vec![MutationRecord::Attributes {
            target: selectors().node_for(ControlKind::Enable),
            attribute: "class".to_string(),
        }];
        assert!(!is_relevant_batch(&selectors(), &batch));
    }

    #[test]
    fn test_control_added_or_removed_is_relevant() {
        let s = selectors();
        let added = vec![MutationRecord::ChildList {
            added: vec![DomNode::text(), s.node_for(ControlKind::Disable)],
            removed: vec![],
        }];
        let removed = vec![MutationRecord::ChildList {
            added: vec![],
            removed: vec![s.node_for(ControlKind::Enable)],
        }];
        assert!(is_relevant_batch(&s, &added));
        assert!(is_relevant_batch(&s, &removed));
    }

    #[test]
    fn test_unrelated_child_list_is_ignored() {
        let batch = vec![
            MutationRecord::ChildList {
                added: vec![DomNode::element("div"), DomNode::text()],
                removed: vec![DomNode::element("button").with_attribute("aria-label", "Send")],
            },
            MutationRecord::Attributes {
                target: DomNode::element("span"),
                attribute: "aria-label".to_string(),
            },
        ];
        assert!(!is_relevant_batch(&selectors(), &batch));
        assert!(!is_relevant_batch(&selectors(), &[]));
    }

    #[test]
    fn test_one_relevant_record_is_enough() {
        let s = selectors();
        let batch = vec![
            MutationRecord::ChildList {
                added: vec![DomNode::element("p")],
                removed: vec![],
            },
            MutationRecord::ChildList {
                added: vec![s.node_for(ControlKind::Enable)],
                removed: vec![],
            },
        ];
        assert!(is_relevant_batch(&s, &batch));
    }
}
