use std::time::{SystemTime, UNIX_EPOCH};

use crate::alerts::Icon;
use crate::store::{Contact, NotificationKind};

/// Full view model handed to the UI. Rebuilt by the core and emitted as a
/// whole; the UI never mutates it.
#[derive(Debug, Clone)]
pub struct InboxState {
    /// Monotonic revision, bumped on every emitted snapshot.
    pub rev: u64,
    pub session: SessionState,
    pub threads: Vec<ThreadSummary>,
    pub current_conversation: Option<ConversationView>,
    pub notifications: Vec<NotificationView>,
    /// Reconciled badge count, never negative.
    pub unread_notifications: u64,
    /// One-shot banner; sticks until `ClearToast`.
    pub toast: Option<String>,
}

impl InboxState {
    pub fn empty() -> Self {
        Self {
            rev: 0,
            session: SessionState::LoggedOut,
            threads: Vec::new(),
            current_conversation: None,
            notifications: Vec::new(),
            unread_notifications: 0,
            toast: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    LoggedOut,
    LoggedIn { user: Contact },
}

/// One row of the conversation overview list.
#[derive(Debug, Clone)]
pub struct ThreadSummary {
    pub contact: Contact,
    pub last_message: Option<String>,
    pub last_message_at: Option<i64>,
    pub unread_count: u32,
}

#[derive(Debug, Clone)]
pub struct ConversationView {
    pub contact: Contact,
    /// Ascending by day; messages within a day ascending by (created_at, id).
    pub days: Vec<DayGroup>,
    pub can_load_older: bool,
}

#[derive(Debug, Clone)]
pub struct DayGroup {
    /// Human-readable day header, e.g. "3 January 2026".
    pub label: String,
    pub messages: Vec<MessageView>,
}

#[derive(Debug, Clone)]
pub struct MessageView {
    pub id: String,
    pub sender_id: String,
    pub body: String,
    pub created_at: i64,
    pub is_read: bool,
    pub is_mine: bool,
    pub reply_to: Option<String>,
    pub delivery: DeliveryState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryState {
    /// Optimistic entry awaiting server confirmation.
    Pending,
    Sent,
}

#[derive(Debug, Clone)]
pub struct NotificationView {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    pub link: Option<String>,
    pub created_at: i64,
    pub actor: Option<Contact>,
    pub icon: Icon,
}

pub fn now_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_state_is_logged_out_with_no_data() {
        let state = InboxState::empty();
        assert_eq!(state.rev, 0);
        assert_eq!(state.session, SessionState::LoggedOut);
        assert!(state.threads.is_empty());
        assert!(state.current_conversation.is_none());
        assert!(state.notifications.is_empty());
        assert_eq!(state.unread_notifications, 0);
        assert!(state.toast.is_none());
    }

    #[test]
    fn now_seconds_is_past_2020() {
        assert!(now_seconds() > 1_577_836_800);
    }
}
