// Conversation windows + thread overview.

use super::*;

use chrono::{Local, NaiveDate, TimeZone};

use crate::state::{ConversationView, DayGroup, DeliveryState, MessageView, ThreadSummary};
use crate::store::{ConversationPage, ThreadPage};

impl InboxCore {
    pub(super) fn open_conversation(&mut self, contact_id: &str) {
        if !self.is_logged_in() {
            self.toast("Please log in first");
            return;
        }

        // Opening (or re-opening) always starts a fresh window and re-arms
        // the read sweep.
        if let Some(prev) = self.conversation.take() {
            prev.alive.store(false, Ordering::SeqCst);
        }
        self.conversation_gate.invalidate();

        let contact = self.resolve_contact(contact_id);
        self.conversation = Some(OpenConversation {
            contact,
            messages: Vec::new(),
            window_limit: Arc::new(AtomicU32::new(self.conversation_page_size())),
            can_load_older: false,
            read_sweep_armed: true,
            alive: Arc::new(AtomicBool::new(true)),
        });
        self.rebuild_conversation();
        self.emit_state();

        // First tick fires immediately, so this doubles as the open pull.
        self.spawn_conversation_poll_loop();
    }

    pub(super) fn close_conversation(&mut self) {
        if let Some(conv) = self.conversation.take() {
            conv.alive.store(false, Ordering::SeqCst);
        }
        self.conversation_gate.invalidate();
        self.rebuild_conversation();
        // The open thread's unread falls back to the server value.
        self.rebuild_thread_list();
        self.emit_state();
    }

    pub(super) fn load_older_messages(&mut self) {
        let page = self.conversation_page_size();
        let Some(conv) = self.conversation.as_ref() else {
            return;
        };
        if !conv.can_load_older {
            return;
        }
        conv.window_limit.fetch_add(page, Ordering::SeqCst);
        self.spawn_conversation_fetch();
    }

    pub(super) fn apply_threads_result(
        &mut self,
        seq: u64,
        result: Result<ThreadPage, StoreError>,
    ) {
        if !self.threads_gate.admit(seq) {
            tracing::debug!(seq, "stale thread response discarded");
            return;
        }
        let page = match result {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(%e, "thread poll failed");
                return;
            }
        };
        if page.has_more {
            tracing::debug!(total = page.total_count, "thread overview truncated at page size");
        }
        self.threads_page = page.threads;
        self.rebuild_thread_list();
        self.emit_state();
    }

    /// Folds a confirmed outgoing message into the cached thread row, so the
    /// preview keeps it after its pending entry is retired even when the
    /// window is not open. The next admitted thread page replaces the row
    /// wholesale and already carries the message.
    pub(super) fn advance_thread_tail(&mut self, contact_id: &str, message: &Message) {
        let Some(thread) = self
            .threads_page
            .iter_mut()
            .find(|t| t.contact.id == contact_id)
        else {
            return;
        };
        let newer = thread.last_message.as_ref().map_or(true, |m| {
            (m.created_at, m.id.as_str()) <= (message.created_at, message.id.as_str())
        });
        if newer {
            thread.updated_at = thread.updated_at.max(message.created_at);
            thread.last_message = Some(message.clone());
        }
    }

    pub(super) fn apply_conversation_result(
        &mut self,
        seq: u64,
        contact_id: &str,
        result: Result<ConversationPage, StoreError>,
    ) {
        if !self.conversation_gate.admit(seq) {
            tracing::debug!(seq, "stale conversation response discarded");
            return;
        }
        let page = match result {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(%e, "conversation poll failed");
                return;
            }
        };
        let Some(conv) = self.conversation.as_mut() else {
            return;
        };
        if conv.contact.id != contact_id {
            // Window belongs to a conversation that is no longer open.
            return;
        }

        tracing::debug!(
            total = page.total_count,
            page = page.page,
            fetched = page.messages.len(),
            "conversation window applied"
        );
        conv.messages = page.messages;
        conv.can_load_older = page.has_next_page;

        // Stores that keep the client-chosen id make the canonical row
        // collide with its pending entry; drop the duplicate.
        let present: HashSet<String> = conv.messages.iter().map(|m| m.id.clone()).collect();
        self.pending_sends.retain(|corr, _| !present.contains(corr));

        self.run_read_sweep();
        self.rebuild_conversation();
        self.rebuild_thread_list();
        self.emit_state();
    }

    /// Marks every counterpart message visible in the first admitted window
    /// read, locally and (in one batch) on the server.
    fn run_read_sweep(&mut self) {
        let Some(sess) = self.session.as_ref() else {
            return;
        };
        let self_id = sess.user.id.clone();
        let Some(conv) = self.conversation.as_mut() else {
            return;
        };
        if !conv.read_sweep_armed {
            return;
        }
        // One sweep per open event, consumed by the first admitted window
        // even when it has nothing to mark.
        conv.read_sweep_armed = false;

        let counterpart = conv.contact.id.clone();
        let mut ids: Vec<String> = Vec::new();
        for m in conv.messages.iter_mut() {
            if m.sender.id == counterpart && m.recipient.id == self_id && !m.is_read {
                m.is_read = true;
                ids.push(m.id.clone());
            }
        }
        if ids.is_empty() {
            return;
        }
        tracing::debug!(count = ids.len(), "marking visible messages read");
        let store = self.store.clone();
        self.spawn_best_effort("mark_multiple_read", async move {
            store.mark_multiple_read(&ids).await
        });
    }

    pub(super) fn rebuild_conversation(&mut self) {
        let view = match (self.session.as_ref(), self.conversation.as_ref()) {
            (Some(sess), Some(conv)) => {
                let merged = self.merged_window(conv, &sess.user.id);
                Some(ConversationView {
                    contact: conv.contact.clone(),
                    days: group_by_day(merged, &Local),
                    can_load_older: conv.can_load_older,
                })
            }
            _ => None,
        };
        self.state.current_conversation = view;
    }

    /// Server window plus optimistic entries for this counterpart, ascending
    /// by (created_at, id). Ids stay unique: a pending entry is skipped once
    /// the window carries a row under the same id.
    fn merged_window(&self, conv: &OpenConversation, self_id: &str) -> Vec<MessageView> {
        let mut views: Vec<MessageView> = conv
            .messages
            .iter()
            .map(|m| message_view(m, self_id, DeliveryState::Sent))
            .collect();

        let present_ids: HashSet<&str> = conv.messages.iter().map(|m| m.id.as_str()).collect();
        for (corr, pending) in &self.pending_sends {
            if pending.message.recipient.id != conv.contact.id {
                continue;
            }
            if present_ids.contains(corr.as_str()) {
                continue;
            }
            views.push(message_view(&pending.message, self_id, DeliveryState::Pending));
        }

        views.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        views
    }

    pub(super) fn rebuild_thread_list(&mut self) {
        let mut list: Vec<ThreadSummary> = Vec::new();
        for thread in &self.threads_page {
            let (last_message, last_message_at) = self.thread_preview(thread);
            list.push(ThreadSummary {
                contact: thread.contact.clone(),
                last_message,
                last_message_at,
                unread_count: self.thread_unread(thread),
            });
        }
        list.sort_by_key(|t| std::cmp::Reverse(t.last_message_at.unwrap_or(0)));
        self.state.threads = list;
    }

    fn thread_preview(&self, thread: &Thread) -> (Option<String>, Option<i64>) {
        let mut preview = thread.last_message.as_ref().map(|m| m.body.clone());
        let mut preview_at = thread
            .last_message
            .as_ref()
            .map(|m| m.created_at)
            .or(Some(thread.updated_at));

        // A loaded window can run ahead of the thread snapshot; confirmed
        // sends land there first.
        if let Some(conv) = self.conversation.as_ref() {
            if conv.contact.id == thread.contact.id {
                let newest = conv.messages.iter().max_by(|a, b| {
                    a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
                });
                if let Some(newest) = newest {
                    if preview_at.map_or(true, |ts| newest.created_at > ts) {
                        preview = Some(newest.body.clone());
                        preview_at = Some(newest.created_at);
                    }
                }
            }
        }

        // Merge with the optimistic outbox so previews update the moment a
        // send is dispatched.
        let local_last = self
            .pending_sends
            .values()
            .filter(|p| p.message.recipient.id == thread.contact.id)
            .max_by(|a, b| {
                a.message
                    .created_at
                    .cmp(&b.message.created_at)
                    .then_with(|| a.seq.cmp(&b.seq))
            });
        let local_last_at = local_last.map(|p| p.message.created_at);

        match (preview_at, local_last_at) {
            (Some(a), Some(b)) if b > a => (local_last.map(|p| p.message.body.clone()), Some(b)),
            (None, Some(b)) => (local_last.map(|p| p.message.body.clone()), Some(b)),
            _ => (preview, preview_at),
        }
    }
}

fn message_view(message: &Message, self_id: &str, delivery: DeliveryState) -> MessageView {
    MessageView {
        id: message.id.clone(),
        sender_id: message.sender.id.clone(),
        body: message.body.clone(),
        created_at: message.created_at,
        is_read: message.is_read,
        is_mine: message.sender.id == self_id,
        reply_to: message.reply_to.clone(),
        delivery,
    }
}

/// Buckets an already-sorted window into local-calendar days. Grouping
/// depends on the zone: the same instants can land in one bucket or two.
fn group_by_day<Tz: TimeZone>(messages: Vec<MessageView>, tz: &Tz) -> Vec<DayGroup> {
    let mut days: Vec<DayGroup> = Vec::new();
    let mut current: Option<(NaiveDate, Vec<MessageView>)> = None;
    for message in messages {
        let day = local_day(message.created_at, tz);
        match current.as_mut() {
            Some((d, bucket)) if *d == day => bucket.push(message),
            _ => {
                if let Some((d, bucket)) = current.take() {
                    days.push(DayGroup {
                        label: day_label(d),
                        messages: bucket,
                    });
                }
                current = Some((day, vec![message]));
            }
        }
    }
    if let Some((d, bucket)) = current {
        days.push(DayGroup {
            label: day_label(d),
            messages: bucket,
        });
    }
    days
}

fn local_day<Tz: TimeZone>(ts: i64, tz: &Tz) -> NaiveDate {
    tz.timestamp_opt(ts, 0)
        .single()
        .map(|dt| dt.date_naive())
        .unwrap_or(NaiveDate::MIN)
}

fn day_label(day: NaiveDate) -> String {
    day.format("%-d %B %Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn view(id: &str, created_at: i64) -> MessageView {
        MessageView {
            id: id.to_string(),
            sender_id: "alice".to_string(),
            body: format!("body {id}"),
            created_at,
            is_read: true,
            is_mine: false,
            reply_to: None,
            delivery: DeliveryState::Sent,
        }
    }

    // 2026-01-03 23:30 UTC and 2026-01-04 00:30 UTC.
    const LATE_JAN_3: i64 = 1_767_483_000;
    const EARLY_JAN_4: i64 = 1_767_486_600;

    #[test]
    fn splits_on_local_midnight() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let days = group_by_day(vec![view("a", LATE_JAN_3), view("b", EARLY_JAN_4)], &utc);
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].label, "3 January 2026");
        assert_eq!(days[1].label, "4 January 2026");
        assert_eq!(days[0].messages[0].id, "a");
        assert_eq!(days[1].messages[0].id, "b");
    }

    #[test]
    fn grouping_follows_the_zone_not_utc() {
        // One hour east of UTC both instants fall on Jan 4.
        let cet = FixedOffset::east_opt(3600).unwrap();
        let days = group_by_day(vec![view("a", LATE_JAN_3), view("b", EARLY_JAN_4)], &cet);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].label, "4 January 2026");
        assert_eq!(days[0].messages.len(), 2);
    }

    #[test]
    fn preserves_order_within_a_day() {
        let utc = FixedOffset::east_opt(0).unwrap();
        let days = group_by_day(
            vec![
                view("a", LATE_JAN_3 - 120),
                view("b", LATE_JAN_3 - 60),
                view("c", LATE_JAN_3),
            ],
            &utc,
        );
        assert_eq!(days.len(), 1);
        let ids: Vec<&str> = days[0].messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn empty_window_yields_no_groups() {
        let utc = FixedOffset::east_opt(0).unwrap();
        assert!(group_by_day(vec![], &utc).is_empty());
    }
}
