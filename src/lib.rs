mod actions;
mod alerts;
mod core;
mod logging;
mod state;
mod store;
mod updates;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;

use flume::{Receiver, Sender};

pub use actions::InboxAction;
pub use alerts::*;
pub use state::*;
pub use store::*;
pub use updates::*;

pub trait Reconciler: Send + Sync + 'static {
    fn reconcile(&self, update: InboxUpdate);
}

pub struct InboxApp {
    core_tx: Sender<CoreMsg>,
    update_rx: Receiver<InboxUpdate>,
    listening: AtomicBool,
    shared_state: Arc<RwLock<InboxState>>,
    alert_presenter: Arc<RwLock<Option<Arc<dyn AlertPresenter>>>>,
    navigator: Arc<RwLock<Option<Arc<dyn Navigator>>>>,
}

impl InboxApp {
    pub fn new(data_dir: String, store: Arc<dyn RemoteStore>) -> Arc<Self> {
        logging::init_logging();
        tracing::info!(data_dir = %data_dir, "InboxApp::new() starting");

        let (update_tx, update_rx) = flume::unbounded();
        let (core_tx, core_rx) = flume::unbounded::<CoreMsg>();
        let shared_state = Arc::new(RwLock::new(InboxState::empty()));
        let alert_presenter: Arc<RwLock<Option<Arc<dyn AlertPresenter>>>> =
            Arc::new(RwLock::new(None));
        let navigator: Arc<RwLock<Option<Arc<dyn Navigator>>>> = Arc::new(RwLock::new(None));

        // Actor loop thread (single threaded "inbox actor").
        let core_tx_for_core = core_tx.clone();
        let shared_for_core = shared_state.clone();
        let presenter_for_core = alert_presenter.clone();
        let navigator_for_core = navigator.clone();
        thread::spawn(move || {
            let mut core = crate::core::InboxCore::new(
                update_tx,
                core_tx_for_core,
                data_dir,
                store,
                shared_for_core,
                presenter_for_core,
                navigator_for_core,
            );
            while let Ok(msg) = core_rx.recv() {
                core.handle_message(msg);
            }
        });

        Arc::new(Self {
            core_tx,
            update_rx,
            listening: AtomicBool::new(false),
            shared_state,
            alert_presenter,
            navigator,
        })
    }

    pub fn state(&self) -> InboxState {
        match self.shared_state.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        }
    }

    pub fn dispatch(&self, action: InboxAction) {
        // Contract: never block caller.
        let _ = self.core_tx.send(CoreMsg::Action(action));
    }

    pub fn listen_for_updates(&self, reconciler: Box<dyn Reconciler>) {
        if self
            .listening
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            // Avoid multiple listeners that would split messages.
            return;
        }

        let rx = self.update_rx.clone();
        thread::spawn(move || {
            while let Ok(update) = rx.recv() {
                reconciler.reconcile(update);
            }
        });
    }

    pub fn set_alert_presenter(&self, presenter: Box<dyn AlertPresenter>) {
        let presenter: Arc<dyn AlertPresenter> = Arc::from(presenter);
        match self.alert_presenter.write() {
            Ok(mut slot) => {
                *slot = Some(presenter);
            }
            Err(poison) => {
                *poison.into_inner() = Some(presenter);
            }
        }
    }

    pub fn set_navigator(&self, navigator: Box<dyn Navigator>) {
        let navigator: Arc<dyn Navigator> = Arc::from(navigator);
        match self.navigator.write() {
            Ok(mut slot) => {
                *slot = Some(navigator);
            }
            Err(poison) => {
                *poison.into_inner() = Some(navigator);
            }
        }
    }
}
