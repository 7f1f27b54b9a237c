use crate::actions::InboxAction;
use crate::alerts::AlertOutcome;
use crate::state::InboxState;
use crate::store::{ConversationPage, Message, NotificationBatch, StoreError, ThreadPage};

/// Messages pushed to the registered reconciler.
#[derive(Debug, Clone)]
pub enum InboxUpdate {
    FullState(InboxState),
    /// Side-channel for a failed optimistic send so the UI can restore the
    /// compose box and offer a retry.
    SendFailed {
        rev: u64,
        recipient_id: String,
        body: String,
        reason: String,
    },
}

impl InboxUpdate {
    pub fn rev(&self) -> u64 {
        match self {
            InboxUpdate::FullState(state) => state.rev,
            InboxUpdate::SendFailed { rev, .. } => *rev,
        }
    }
}

/// Everything the core's event loop consumes: UI actions plus results of its
/// own spawned work.
#[derive(Debug)]
pub enum CoreMsg {
    Action(InboxAction),
    Internal(Box<InternalEvent>),
}

/// Results of spawned tasks, routed back into the event loop so all state
/// changes happen on one thread.
#[derive(Debug)]
pub enum InternalEvent {
    /// `seq` was stamped from the thread source's issue counter when the
    /// request went out.
    ThreadsFetched {
        seq: u64,
        result: Result<ThreadPage, StoreError>,
    },
    NotificationsFetched {
        seq: u64,
        result: Result<NotificationBatch, StoreError>,
    },
    UnreadCountFetched {
        seq: u64,
        result: Result<u64, StoreError>,
    },
    ConversationFetched {
        seq: u64,
        contact_id: String,
        result: Result<ConversationPage, StoreError>,
    },
    /// Stamped with the session epoch at issue time; results from a torn-down
    /// session are dropped.
    SendMessageResult {
        epoch: u64,
        correlation_id: String,
        recipient_id: String,
        result: Result<Message, StoreError>,
    },
    AlertResolved {
        epoch: u64,
        id: String,
        link: Option<String>,
        outcome: AlertOutcome,
    },
}
