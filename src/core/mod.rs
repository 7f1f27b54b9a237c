mod config;
mod mutations;
mod notifications;
mod poll;
mod reconcile;
mod session;
mod threads;

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, RwLock};

use flume::Sender;

use crate::actions::InboxAction;
use crate::alerts::{AlertOutcome, AlertPresenter, AlertRequest, Navigator};
use crate::state::{now_seconds, InboxState, SessionState};
use crate::store::{Contact, Message, Notification, RemoteStore, StoreError, Thread};
use crate::updates::{CoreMsg, InboxUpdate, InternalEvent};

use poll::PollGate;

pub(crate) type SharedAlertPresenter = Arc<RwLock<Option<Arc<dyn AlertPresenter>>>>;
pub(crate) type SharedNavigator = Arc<RwLock<Option<Arc<dyn Navigator>>>>;

/// One optimistic send awaiting confirmation, keyed by correlation id.
#[derive(Debug, Clone)]
struct PendingSend {
    message: Message,
    seq: u64,
}

struct Session {
    user: Contact,
    /// Flipped off at teardown; spawned tasks check it at every await point.
    alive: Arc<AtomicBool>,
}

struct OpenConversation {
    contact: Contact,
    /// Server copy of the loaded window; optimistic entries live in
    /// `pending_sends` and are merged at view-build time.
    messages: Vec<Message>,
    /// Grows by one page per `LoadOlderMessages`; the poll loop reads it
    /// fresh on every tick.
    window_limit: Arc<AtomicU32>,
    can_load_older: bool,
    /// Armed at open, consumed by the first admitted window.
    read_sweep_armed: bool,
    alive: Arc<AtomicBool>,
}

pub(crate) struct InboxCore {
    pub state: InboxState,
    rev: u64,
    outbox_seq: u64,
    last_outgoing_ts: i64,

    update_sender: Sender<InboxUpdate>,
    core_sender: Sender<CoreMsg>,
    shared_state: Arc<RwLock<InboxState>>,

    store: Arc<dyn RemoteStore>,
    alert_presenter: SharedAlertPresenter,
    navigator: SharedNavigator,

    config: config::InboxConfig,
    runtime: tokio::runtime::Runtime,

    session: Option<Session>,
    /// Bumped on every session start/stop; mutation results carry the epoch
    /// they were issued under and are dropped on mismatch.
    session_epoch: u64,

    threads_gate: PollGate,
    notifications_gate: PollGate,
    unread_gate: PollGate,
    conversation_gate: PollGate,

    // Server snapshots, replaced wholesale on each admitted poll.
    threads_page: Vec<Thread>,
    notifications: Vec<Notification>,
    server_unread: u64,
    /// Of the last batch, how many tombstoned notifications the server still
    /// counted as unread.
    tombstoned_unread: u64,

    conversation: Option<OpenConversation>,

    // Optimistic side tables, all session-scoped.
    pending_sends: HashMap<String, PendingSend>,
    shown_alerts: HashSet<String>,
    tombstones: HashSet<String>,
}

impl InboxCore {
    pub(crate) fn new(
        update_sender: Sender<InboxUpdate>,
        core_sender: Sender<CoreMsg>,
        data_dir: String,
        store: Arc<dyn RemoteStore>,
        shared_state: Arc<RwLock<InboxState>>,
        alert_presenter: SharedAlertPresenter,
        navigator: SharedNavigator,
    ) -> Self {
        let config = config::load_inbox_config(&data_dir);
        let state = InboxState::empty();

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_time()
            .build()
            .expect("tokio runtime");

        let this = Self {
            state,
            rev: 0,
            outbox_seq: 0,
            last_outgoing_ts: 0,
            update_sender,
            core_sender,
            shared_state,
            store,
            alert_presenter,
            navigator,
            config,
            runtime,
            session: None,
            session_epoch: 0,
            threads_gate: PollGate::new(),
            notifications_gate: PollGate::new(),
            unread_gate: PollGate::new(),
            conversation_gate: PollGate::new(),
            threads_page: Vec::new(),
            notifications: Vec::new(),
            server_unread: 0,
            tombstoned_unread: 0,
            conversation: None,
            pending_sends: HashMap::new(),
            shown_alerts: HashSet::new(),
            tombstones: HashSet::new(),
        };

        // Ensure InboxApp.state() has an immediately-available snapshot.
        let snapshot = this.state.clone();
        this.commit_state_snapshot(&snapshot);
        this
    }

    fn next_rev(&mut self) -> u64 {
        self.rev += 1;
        self.state.rev = self.rev;
        self.rev
    }

    fn commit_state_snapshot(&self, snapshot: &InboxState) {
        match self.shared_state.write() {
            Ok(mut g) => *g = snapshot.clone(),
            Err(poison) => *poison.into_inner() = snapshot.clone(),
        }
    }

    fn emit_state(&mut self) {
        self.next_rev();
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        let _ = self.update_sender.send(InboxUpdate::FullState(snapshot));
    }

    fn emit_send_failed(&mut self, recipient_id: String, body: String, reason: String) {
        let rev = self.next_rev();
        // Keep snapshot rev in sync with the update stream even though this is
        // a side-effect update.
        let snapshot = self.state.clone();
        self.commit_state_snapshot(&snapshot);
        let _ = self.update_sender.send(InboxUpdate::SendFailed {
            rev,
            recipient_id,
            body,
            reason,
        });
    }

    fn toast(&mut self, msg: impl Into<String>) {
        // Keep toast in state until the UI explicitly clears it, so a state()
        // resync still contains it.
        self.state.toast = Some(msg.into());
        self.emit_state();
    }

    fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// Fire-and-forget store mutation: the outcome only matters for logs, the
    /// next poll picks up whatever the server settled on.
    fn spawn_best_effort<F>(&self, op: &'static str, fut: F)
    where
        F: Future<Output = Result<(), StoreError>> + Send + 'static,
    {
        self.runtime.spawn(async move {
            match fut.await {
                Ok(()) => tracing::debug!(op, "store mutation applied"),
                Err(e) => tracing::warn!(op, %e, "store mutation failed"),
            }
        });
    }

    pub(crate) fn handle_message(&mut self, msg: CoreMsg) {
        match msg {
            CoreMsg::Action(ref action) => {
                // Tags only: message bodies must never reach the logs.
                tracing::info!(action = action.tag(), "dispatch");
                self.handle_action(action.clone());
            }
            CoreMsg::Internal(internal) => self.handle_internal(*internal),
        }
    }

    fn handle_action(&mut self, action: InboxAction) {
        match action {
            // Session
            InboxAction::Login { user } => self.start_session(user),
            InboxAction::Logout => {
                self.stop_session();
                self.clear_session_state();
                self.state.session = SessionState::LoggedOut;
                self.emit_state();
            }

            // Conversations
            InboxAction::OpenConversation { contact_id } => self.open_conversation(&contact_id),
            InboxAction::CloseConversation => self.close_conversation(),
            InboxAction::LoadOlderMessages => self.load_older_messages(),
            InboxAction::SendMessage { recipient_id, body } => {
                self.send_message(&recipient_id, body)
            }
            InboxAction::MarkMessageRead { message_id } => self.mark_message_read(&message_id),

            // Notifications
            InboxAction::MarkNotificationRead { id } => self.mark_notification_read(&id),
            InboxAction::MarkAllNotificationsRead => self.mark_all_notifications_read(),
            InboxAction::DeleteNotification { id } => self.delete_notification(&id),

            // App lifecycle
            InboxAction::Foregrounded => {
                // Native sends lifecycle signals as actions; Rust owns all
                // state changes.
                if self.is_logged_in() {
                    self.refresh_now();
                }
            }
            InboxAction::ClearToast => {
                if self.state.toast.is_some() {
                    self.state.toast = None;
                    self.emit_state();
                }
            }
        }
    }

    fn handle_internal(&mut self, internal: InternalEvent) {
        match internal {
            InternalEvent::ThreadsFetched { seq, result } => {
                self.apply_threads_result(seq, result)
            }
            InternalEvent::NotificationsFetched { seq, result } => {
                self.apply_notifications_result(seq, result)
            }
            InternalEvent::UnreadCountFetched { seq, result } => {
                self.apply_unread_count_result(seq, result)
            }
            InternalEvent::ConversationFetched {
                seq,
                contact_id,
                result,
            } => self.apply_conversation_result(seq, &contact_id, result),
            InternalEvent::SendMessageResult {
                epoch,
                correlation_id,
                recipient_id,
                result,
            } => self.apply_send_result(epoch, correlation_id, recipient_id, result),
            InternalEvent::AlertResolved {
                epoch,
                id,
                link,
                outcome,
            } => self.apply_alert_resolution(epoch, &id, link, outcome),
        }
    }

    /// Drops everything tied to the previous identity. Runs on logout and
    /// before a new login.
    fn clear_session_state(&mut self) {
        self.threads_page.clear();
        self.notifications.clear();
        self.server_unread = 0;
        self.tombstoned_unread = 0;
        self.conversation = None;
        self.pending_sends.clear();
        self.shown_alerts.clear();
        self.tombstones.clear();
        self.last_outgoing_ts = 0;
        self.state.threads.clear();
        self.state.current_conversation = None;
        self.state.notifications.clear();
        self.state.unread_notifications = 0;
    }
}
