use crate::store::Contact;

/// Everything the UI can ask the core to do.
#[derive(Debug, Clone)]
pub enum InboxAction {
    // Session
    Login { user: Contact },
    Logout,

    // Conversations
    OpenConversation { contact_id: String },
    CloseConversation,
    LoadOlderMessages,
    SendMessage { recipient_id: String, body: String },
    MarkMessageRead { message_id: String },

    // Notifications
    MarkNotificationRead { id: String },
    MarkAllNotificationsRead,
    DeleteNotification { id: String },

    // App lifecycle
    Foregrounded,
    ClearToast,
}

impl InboxAction {
    /// Log-safe tag. Never includes message bodies or contact data.
    pub fn tag(&self) -> &'static str {
        match self {
            InboxAction::Login { .. } => "Login",
            InboxAction::Logout => "Logout",
            InboxAction::OpenConversation { .. } => "OpenConversation",
            InboxAction::CloseConversation => "CloseConversation",
            InboxAction::LoadOlderMessages => "LoadOlderMessages",
            InboxAction::SendMessage { .. } => "SendMessage",
            InboxAction::MarkMessageRead { .. } => "MarkMessageRead",
            InboxAction::MarkNotificationRead { .. } => "MarkNotificationRead",
            InboxAction::MarkAllNotificationsRead => "MarkAllNotificationsRead",
            InboxAction::DeleteNotification { .. } => "DeleteNotification",
            InboxAction::Foregrounded => "Foregrounded",
            InboxAction::ClearToast => "ClearToast",
        }
    }
}
