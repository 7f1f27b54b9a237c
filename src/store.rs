use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A user identity as the remote store reports it. The store owns contact
/// data; the core never edits it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// One direct message. `is_read` is the recipient-side flag: for a message
/// you sent it doubles as the read receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub sender: Contact,
    pub recipient: Contact,
    pub body: String,
    pub created_at: i64,
    pub is_read: bool,
    /// Parent message when this one is a reply.
    #[serde(default)]
    pub reply_to: Option<String>,
    /// Ids of replies to this message, in thread order.
    #[serde(default)]
    pub replies: Vec<String>,
}

/// One row of the thread overview: the counterpart plus enough to render a
/// list entry without loading the conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub contact: Contact,
    #[serde(default)]
    pub last_message: Option<Message>,
    pub unread_count: u32,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    NewMessage,
    NewOrder,
    OrderStatus,
    Payment,
    Review,
    System,
    /// Kinds added server-side after this build shipped.
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub is_read: bool,
    /// In-app destination to open when the user acts on this notification.
    #[serde(default)]
    pub link: Option<String>,
    pub created_at: i64,
    /// Contact that caused the notification, when there is one.
    #[serde(default)]
    pub actor: Option<Contact>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadPage {
    pub threads: Vec<Thread>,
    pub total_count: u64,
    pub has_more: bool,
    pub page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationPage {
    pub messages: Vec<Message>,
    pub total_count: u64,
    pub has_next_page: bool,
    pub page: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationBatch {
    pub notifications: Vec<Notification>,
    /// Server-authoritative count across all pages, not just this batch.
    pub unread_count: u64,
}

/// Failures the store can report. All are transient from the core's point of
/// view: pulls retry on the next tick, mutations surface or log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("network error: {0}")]
    Network(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("store unavailable")]
    Unavailable,
}

/// Query and mutation surface of the remote message/notification store.
///
/// Implementations wrap whatever transport the host application uses; the
/// core only ever talks through these calls. All methods must be safe to
/// invoke concurrently.
#[async_trait]
pub trait RemoteStore: Send + Sync + 'static {
    async fn fetch_threads(&self) -> Result<ThreadPage, StoreError>;

    /// Newest `limit` messages exchanged with `user_id`, page 0 first.
    async fn fetch_conversation(
        &self,
        user_id: &str,
        page: u32,
        limit: u32,
    ) -> Result<ConversationPage, StoreError>;

    async fn fetch_notifications(
        &self,
        user_id: &str,
        limit: u32,
    ) -> Result<NotificationBatch, StoreError>;

    /// Lightweight badge query; same number `fetch_notifications` reports.
    async fn fetch_unread_count(&self) -> Result<u64, StoreError>;

    /// Returns the canonical message the server stored.
    async fn send_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        body: &str,
    ) -> Result<Message, StoreError>;

    /// Marks one message or notification read. Idempotent server-side.
    async fn mark_read(&self, id: &str) -> Result<(), StoreError>;

    async fn mark_multiple_read(&self, ids: &[String]) -> Result<(), StoreError>;

    /// Marks every notification for `user_id` read.
    async fn mark_all_read(&self, user_id: &str) -> Result<(), StoreError>;

    async fn delete_notification(&self, id: &str) -> Result<(), StoreError>;
}
