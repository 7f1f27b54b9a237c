// Optimistic writes: sends, read transitions, deletes.

use super::*;

use uuid::Uuid;

impl InboxCore {
    pub(super) fn send_message(&mut self, recipient_id: &str, body: String) {
        let Some(sess) = self.session.as_ref() else {
            self.toast("Please log in first");
            return;
        };
        let sender = sess.user.clone();
        let sender_id = sess.user.id.clone();

        let body = body.trim().to_string();
        if body.is_empty() {
            return;
        }

        // Second-granularity timestamps; rapid sends can share one. Keep
        // outgoing timestamps monotonic so ordering and its id tiebreak stay
        // stable.
        let ts = {
            let now = now_seconds();
            if now <= self.last_outgoing_ts {
                self.last_outgoing_ts += 1;
            } else {
                self.last_outgoing_ts = now;
            }
            self.last_outgoing_ts
        };

        let recipient = self.resolve_contact(recipient_id);
        let correlation_id = Uuid::new_v4().to_string();
        let message = Message {
            id: correlation_id.clone(),
            sender,
            recipient,
            body: body.clone(),
            created_at: ts,
            // The sender's own copy is born read.
            is_read: true,
            reply_to: None,
            replies: Vec::new(),
        };

        self.outbox_seq = self.outbox_seq.wrapping_add(1);
        self.pending_sends.insert(
            correlation_id.clone(),
            PendingSend {
                message,
                seq: self.outbox_seq,
            },
        );
        self.rebuild_conversation();
        self.rebuild_thread_list();
        self.emit_state();

        let store = self.store.clone();
        let tx = self.core_sender.clone();
        let epoch = self.session_epoch;
        let recipient_id = recipient_id.to_string();
        self.runtime.spawn(async move {
            let result = store.send_message(&sender_id, &recipient_id, &body).await;
            let event = InternalEvent::SendMessageResult {
                epoch,
                correlation_id,
                recipient_id,
                result,
            };
            let _ = tx.send(CoreMsg::Internal(Box::new(event)));
        });
    }

    pub(super) fn apply_send_result(
        &mut self,
        epoch: u64,
        correlation_id: String,
        recipient_id: String,
        result: Result<Message, StoreError>,
    ) {
        if epoch != self.session_epoch {
            tracing::debug!("send result from a torn-down session ignored");
            return;
        }
        match result {
            Ok(message) => {
                tracing::info!(
                    correlation = %correlation_id,
                    canonical = %message.id,
                    "send confirmed"
                );
                self.pending_sends.remove(&correlation_id);
                self.advance_thread_tail(&recipient_id, &message);
                if let Some(conv) = self.conversation.as_mut() {
                    let duplicate = conv.messages.iter().any(|m| m.id == message.id);
                    if conv.contact.id == recipient_id && !duplicate {
                        conv.messages.push(message);
                    }
                }
                self.rebuild_conversation();
                self.rebuild_thread_list();
                self.emit_state();
            }
            Err(e) => {
                tracing::warn!(correlation = %correlation_id, %e, "send failed");
                let body = self
                    .pending_sends
                    .remove(&correlation_id)
                    .map(|p| p.message.body)
                    .unwrap_or_default();
                self.rebuild_conversation();
                self.rebuild_thread_list();
                self.state.toast = Some(format!("Message failed to send: {e}"));
                self.emit_state();
                self.emit_send_failed(recipient_id, body, e.to_string());
            }
        }
    }

    pub(super) fn mark_message_read(&mut self, message_id: &str) {
        if !self.is_logged_in() {
            return;
        }
        let Some(conv) = self.conversation.as_mut() else {
            return;
        };
        let Some(message) = conv.messages.iter_mut().find(|m| m.id == message_id) else {
            return;
        };
        if message.is_read {
            return;
        }
        message.is_read = true;
        self.rebuild_conversation();
        self.rebuild_thread_list();
        self.emit_state();

        let store = self.store.clone();
        let id = message_id.to_string();
        self.spawn_best_effort("mark_read", async move { store.mark_read(&id).await });
    }

    pub(super) fn mark_notification_read(&mut self, id: &str) {
        if !self.is_logged_in() {
            return;
        }
        let Some(n) = self.notifications.iter_mut().find(|n| n.id == id) else {
            return;
        };
        if n.is_read {
            return;
        }
        n.is_read = true;
        // Local belief until the next batch; the server count then wins.
        self.server_unread = self.server_unread.saturating_sub(1);
        self.reconcile_unread_notifications();
        self.rebuild_notifications();
        self.emit_state();

        let store = self.store.clone();
        let id = id.to_string();
        self.spawn_best_effort("mark_read", async move { store.mark_read(&id).await });
    }

    pub(super) fn mark_all_notifications_read(&mut self) {
        let Some(sess) = self.session.as_ref() else {
            return;
        };
        let user_id = sess.user.id.clone();

        let any_unread = self.notifications.iter().any(|n| !n.is_read);
        if !any_unread && self.state.unread_notifications == 0 {
            // Re-applying is a no-op; skip the round-trip too.
            return;
        }

        for n in self.notifications.iter_mut() {
            n.is_read = true;
        }
        self.server_unread = 0;
        self.tombstoned_unread = 0;
        self.reconcile_unread_notifications();
        self.rebuild_notifications();
        self.emit_state();

        let store = self.store.clone();
        self.spawn_best_effort("mark_all_read", async move {
            store.mark_all_read(&user_id).await
        });
    }

    pub(super) fn delete_notification(&mut self, id: &str) {
        if !self.is_logged_in() {
            return;
        }
        if !self.tombstones.insert(id.to_string()) {
            // Already tombstoned this session.
            return;
        }

        let mut was_unread = false;
        self.notifications.retain(|n| {
            if n.id == id {
                was_unread = !n.is_read;
                false
            } else {
                true
            }
        });
        if was_unread {
            self.server_unread = self.server_unread.saturating_sub(1);
        }
        self.reconcile_unread_notifications();
        self.rebuild_notifications();
        self.emit_state();

        let store = self.store.clone();
        let id = id.to_string();
        self.spawn_best_effort("delete_notification", async move {
            store.delete_notification(&id).await
        });
    }

    pub(super) fn resolve_contact(&self, contact_id: &str) -> Contact {
        if let Some(conv) = self.conversation.as_ref() {
            if conv.contact.id == contact_id {
                return conv.contact.clone();
            }
        }
        if let Some(thread) = self
            .threads_page
            .iter()
            .find(|t| t.contact.id == contact_id)
        {
            return thread.contact.clone();
        }
        // Unknown counterpart (e.g. deep-linked conversation before the first
        // thread pull); the next admitted window carries the full contact.
        Contact {
            id: contact_id.to_string(),
            name: String::new(),
            avatar_url: None,
            email: None,
        }
    }
}
