// Session lifecycle + polling side effects.

use super::*;

use tokio::time::MissedTickBehavior;

impl InboxCore {
    pub(super) fn start_session(&mut self, user: Contact) {
        // Tear down any existing session first.
        self.stop_session();
        self.clear_session_state();

        tracing::info!(user_id = %user.id, "start_session");

        self.session = Some(Session {
            user: user.clone(),
            alive: Arc::new(AtomicBool::new(true)),
        });
        self.state.session = SessionState::LoggedIn { user };
        self.emit_state();

        self.spawn_thread_poll_loop();
        self.spawn_notification_poll_loop();
    }

    pub(super) fn stop_session(&mut self) {
        // Invalidate in-flight pulls and stamp a new epoch so results of the
        // old session's mutations are dropped on arrival.
        self.session_epoch = self.session_epoch.wrapping_add(1);
        self.threads_gate.invalidate();
        self.notifications_gate.invalidate();
        self.unread_gate.invalidate();
        self.conversation_gate.invalidate();

        if let Some(conv) = self.conversation.as_ref() {
            conv.alive.store(false, Ordering::SeqCst);
        }
        if let Some(sess) = self.session.take() {
            sess.alive.store(false, Ordering::SeqCst);
        }
    }

    pub(super) fn spawn_thread_poll_loop(&self) {
        let Some(sess) = self.session.as_ref() else {
            return;
        };
        let alive = sess.alive.clone();
        let store = self.store.clone();
        let tx = self.core_sender.clone();
        let issuer = self.threads_gate.issuer();
        let period = self.thread_poll_period();
        self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                // First tick completes immediately: login implies a pull.
                ticker.tick().await;
                if !alive.load(Ordering::SeqCst) {
                    break;
                }
                let seq = issuer.issue();
                let result = store.fetch_threads().await;
                if !alive.load(Ordering::SeqCst) {
                    break;
                }
                let event = InternalEvent::ThreadsFetched { seq, result };
                if tx.send(CoreMsg::Internal(Box::new(event))).is_err() {
                    break;
                }
            }
        });
    }

    pub(super) fn spawn_notification_poll_loop(&self) {
        let Some(sess) = self.session.as_ref() else {
            return;
        };
        let alive = sess.alive.clone();
        let user_id = sess.user.id.clone();
        let limit = self.notification_limit();
        let store = self.store.clone();
        let tx = self.core_sender.clone();
        let issuer = self.notifications_gate.issuer();
        let period = self.notification_poll_period();
        self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !alive.load(Ordering::SeqCst) {
                    break;
                }
                let seq = issuer.issue();
                let result = store.fetch_notifications(&user_id, limit).await;
                if !alive.load(Ordering::SeqCst) {
                    break;
                }
                let event = InternalEvent::NotificationsFetched { seq, result };
                if tx.send(CoreMsg::Internal(Box::new(event))).is_err() {
                    break;
                }
            }
        });
    }

    /// Polls the open conversation. The first immediate tick doubles as the
    /// out-of-band pull on open; `window_limit` is re-read every tick so a
    /// grown window is picked up without respawning.
    pub(super) fn spawn_conversation_poll_loop(&self) {
        let Some(conv) = self.conversation.as_ref() else {
            return;
        };
        let alive = conv.alive.clone();
        let contact_id = conv.contact.id.clone();
        let window = conv.window_limit.clone();
        let store = self.store.clone();
        let tx = self.core_sender.clone();
        let issuer = self.conversation_gate.issuer();
        let period = self.conversation_poll_period();
        self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !alive.load(Ordering::SeqCst) {
                    break;
                }
                let seq = issuer.issue();
                let limit = window.load(Ordering::SeqCst);
                let result = store.fetch_conversation(&contact_id, 0, limit).await;
                if !alive.load(Ordering::SeqCst) {
                    break;
                }
                let event = InternalEvent::ConversationFetched {
                    seq,
                    contact_id: contact_id.clone(),
                    result,
                };
                if tx.send(CoreMsg::Internal(Box::new(event))).is_err() {
                    break;
                }
            }
        });
    }

    /// One-shot pulls outside the regular cadence (foreground, grown window).
    /// They stamp from the same issue counters as the loops, so per source
    /// whichever response is newest wins and the rest are discarded.
    pub(super) fn refresh_now(&self) {
        self.spawn_threads_fetch();
        self.spawn_notifications_fetch();
        self.spawn_unread_count_fetch();
        if self.conversation.is_some() {
            self.spawn_conversation_fetch();
        }
    }

    pub(super) fn spawn_threads_fetch(&self) {
        let Some(sess) = self.session.as_ref() else {
            return;
        };
        let alive = sess.alive.clone();
        let store = self.store.clone();
        let tx = self.core_sender.clone();
        let issuer = self.threads_gate.issuer();
        self.runtime.spawn(async move {
            let seq = issuer.issue();
            let result = store.fetch_threads().await;
            if !alive.load(Ordering::SeqCst) {
                return;
            }
            let event = InternalEvent::ThreadsFetched { seq, result };
            let _ = tx.send(CoreMsg::Internal(Box::new(event)));
        });
    }

    pub(super) fn spawn_notifications_fetch(&self) {
        let Some(sess) = self.session.as_ref() else {
            return;
        };
        let alive = sess.alive.clone();
        let user_id = sess.user.id.clone();
        let limit = self.notification_limit();
        let store = self.store.clone();
        let tx = self.core_sender.clone();
        let issuer = self.notifications_gate.issuer();
        self.runtime.spawn(async move {
            let seq = issuer.issue();
            let result = store.fetch_notifications(&user_id, limit).await;
            if !alive.load(Ordering::SeqCst) {
                return;
            }
            let event = InternalEvent::NotificationsFetched { seq, result };
            let _ = tx.send(CoreMsg::Internal(Box::new(event)));
        });
    }

    /// Cheap badge refresh. Its own source: a count can never displace a
    /// full batch, and vice versa.
    pub(super) fn spawn_unread_count_fetch(&self) {
        let Some(sess) = self.session.as_ref() else {
            return;
        };
        let alive = sess.alive.clone();
        let store = self.store.clone();
        let tx = self.core_sender.clone();
        let issuer = self.unread_gate.issuer();
        self.runtime.spawn(async move {
            let seq = issuer.issue();
            let result = store.fetch_unread_count().await;
            if !alive.load(Ordering::SeqCst) {
                return;
            }
            let event = InternalEvent::UnreadCountFetched { seq, result };
            let _ = tx.send(CoreMsg::Internal(Box::new(event)));
        });
    }

    pub(super) fn spawn_conversation_fetch(&self) {
        let Some(conv) = self.conversation.as_ref() else {
            return;
        };
        let alive = conv.alive.clone();
        let contact_id = conv.contact.id.clone();
        let window = conv.window_limit.clone();
        let store = self.store.clone();
        let tx = self.core_sender.clone();
        let issuer = self.conversation_gate.issuer();
        self.runtime.spawn(async move {
            let seq = issuer.issue();
            let limit = window.load(Ordering::SeqCst);
            let result = store.fetch_conversation(&contact_id, 0, limit).await;
            if !alive.load(Ordering::SeqCst) {
                return;
            }
            let event = InternalEvent::ConversationFetched {
                seq,
                contact_id,
                result,
            };
            let _ = tx.send(CoreMsg::Internal(Box::new(event)));
        });
    }
}
