// Read-state reconciliation between server snapshots and local optimism.

use super::*;

impl InboxCore {
    /// Unread count for one thread. The loaded window is fresher than the
    /// thread row whenever that conversation is open, so recount from it;
    /// otherwise the server's figure stands.
    pub(super) fn thread_unread(&self, thread: &Thread) -> u32 {
        let Some(sess) = self.session.as_ref() else {
            return thread.unread_count;
        };
        match self.conversation.as_ref() {
            Some(conv) if conv.contact.id == thread.contact.id => {
                unread_in_window(&conv.messages, &sess.user.id)
            }
            _ => thread.unread_count,
        }
    }

    /// Global unread badge: the server total minus unread rows the user
    /// deleted locally this session.
    pub(super) fn reconcile_unread_notifications(&mut self) {
        self.state.unread_notifications =
            reconciled_unread(self.server_unread, self.tombstoned_unread);
    }
}

fn unread_in_window(messages: &[Message], self_id: &str) -> u32 {
    messages
        .iter()
        .filter(|m| m.recipient.id == self_id && !m.is_read)
        .count() as u32
}

fn reconciled_unread(server_unread: u64, tombstoned_unread: u64) -> u64 {
    server_unread.saturating_sub(tombstoned_unread)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contact(id: &str) -> Contact {
        Contact {
            id: id.to_string(),
            name: format!("contact {id}"),
            avatar_url: None,
            email: None,
        }
    }

    fn msg(id: &str, from: &str, to: &str, is_read: bool) -> Message {
        Message {
            id: id.to_string(),
            sender: contact(from),
            recipient: contact(to),
            body: "hi".to_string(),
            created_at: 1_700_000_000,
            is_read,
            reply_to: None,
            replies: Vec::new(),
        }
    }

    #[test]
    fn recount_only_counts_incoming_unread() {
        let window = vec![
            msg("m1", "alice", "me", false),
            msg("m2", "alice", "me", true),
            msg("m3", "me", "alice", false),
            msg("m4", "alice", "me", false),
        ];
        assert_eq!(unread_in_window(&window, "me"), 2);
    }

    #[test]
    fn recount_of_empty_window_is_zero() {
        assert_eq!(unread_in_window(&[], "me"), 0);
    }

    #[test]
    fn badge_subtracts_tombstoned_unread() {
        assert_eq!(reconciled_unread(5, 2), 3);
    }

    #[test]
    fn badge_clamps_at_zero() {
        // A tombstoned row can drop off the server between polls; never
        // show a negative badge.
        assert_eq!(reconciled_unread(1, 3), 0);
    }
}
