use std::sync::Arc;

use proptest::prelude::*;
use tokio::sync::mpsc;

use togglekeeper::domain::models::{
    ControlKind, ControlSelectors, DesiredState, LiveState, TimingConfig,
};
use togglekeeper::infrastructure::page::SimulatedPage;
use togglekeeper::infrastructure::store::InMemoryStateStore;
use togglekeeper::services::{EngineMessage, PersistenceWriter, Reconciliation, ReconciliationEngine};

fn desired_state() -> impl Strategy<Value = DesiredState> {
    prop_oneof![Just(DesiredState::On), Just(DesiredState::Off)]
}

fn live_state() -> impl Strategy<Value = LiveState> {
    prop_oneof![Just(LiveState::On), Just(LiveState::Off), Just(LiveState::Absent)]
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Engine over a fresh page, with `desired` already adopted.
fn engine_for(page: Arc<SimulatedPage>, desired: DesiredState) -> ReconciliationEngine {
    let (writer, _task) = PersistenceWriter::spawn(Arc::new(InMemoryStateStore::new()), "k");
    let (mailbox, _rx) = mpsc::unbounded_channel::<EngineMessage>();
    let mut engine = ReconciliationEngine::new(page, writer, TimingConfig::default(), mailbox);
    engine.initialize(Some(desired));
    engine
}

proptest! {
    /// Property: applying the desired state twice clicks at most once
    ///
    /// After the first apply the page either matches the desired state or
    /// has no control at all, so the second apply never clicks.
    #[test]
    fn prop_apply_desired_is_idempotent(desired in desired_state(), live in live_state()) {
        runtime().block_on(async {
            let page = Arc::new(SimulatedPage::new(ControlSelectors::default(), live));
            let engine = engine_for(page.clone(), desired);

            let first = engine.apply_desired();
            let second = engine.apply_desired();

            prop_assert!(second.clicked().is_none());
            prop_assert!(page.synthesized_clicks().len() <= 1);

            if live == LiveState::Absent {
                prop_assert_eq!(first, Reconciliation::ControlMissing);
                prop_assert_eq!(second, Reconciliation::ControlMissing);
            } else {
                prop_assert_eq!(page.live_state(), LiveState::from(desired));
                prop_assert_eq!(second, Reconciliation::InSync);
            }
            Ok(())
        })?;
    }

    /// Property: drift correction only ever enables
    ///
    /// Whatever the host renders, a drift check either does nothing or
    /// clicks the enable control, and only while the user wants it on.
    #[test]
    fn prop_external_change_only_enables(
        desired in desired_state(),
        renders in proptest::collection::vec(live_state(), 1..12)
    ) {
        runtime().block_on(async {
            let page = Arc::new(SimulatedPage::new(ControlSelectors::default(), LiveState::Absent));
            let engine = engine_for(page.clone(), desired);

            for live in renders {
                page.host_render(live);
                let outcome = engine.on_external_change();
                match outcome.clicked() {
                    Some(control) => {
                        prop_assert_eq!(control, ControlKind::Enable);
                        prop_assert_eq!(desired, DesiredState::On);
                    }
                    None => prop_assert!(desired == DesiredState::Off || live != LiveState::Off),
                }
            }

            if desired == DesiredState::Off {
                prop_assert!(page.synthesized_clicks().is_empty());
            }
            Ok(())
        })?;
    }
}
