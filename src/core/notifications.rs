// Notification ingestion + platform alerts.

use super::*;

use crate::alerts::icon_for;
use crate::state::NotificationView;
use crate::store::NotificationBatch;

impl InboxCore {
    pub(super) fn apply_notifications_result(
        &mut self,
        seq: u64,
        result: Result<NotificationBatch, StoreError>,
    ) {
        if !self.notifications_gate.admit(seq) {
            tracing::debug!(seq, "stale notification response discarded");
            return;
        }
        let batch = match result {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!(%e, "notification poll failed");
                return;
            }
        };
        let NotificationBatch {
            notifications,
            unread_count,
        } = batch;

        // Locally deleted ids stay deleted even while the server still
        // returns them.
        let mut visible = Vec::with_capacity(notifications.len());
        let mut tombstoned_unread = 0u64;
        for n in notifications {
            if self.tombstones.contains(&n.id) {
                if !n.is_read {
                    tombstoned_unread += 1;
                }
                continue;
            }
            visible.push(n);
        }

        self.trigger_alerts(&visible);

        self.notifications = visible;
        self.server_unread = unread_count;
        self.tombstoned_unread = tombstoned_unread;
        self.reconcile_unread_notifications();
        self.rebuild_notifications();
        self.emit_state();
    }

    pub(super) fn apply_unread_count_result(&mut self, seq: u64, result: Result<u64, StoreError>) {
        if !self.unread_gate.admit(seq) {
            tracing::debug!(seq, "stale unread count discarded");
            return;
        }
        match result {
            Ok(count) => {
                self.server_unread = count;
                self.reconcile_unread_notifications();
                self.emit_state();
            }
            Err(e) => tracing::warn!(%e, "unread count fetch failed"),
        }
    }

    /// Decides which rows of an admitted batch produce a platform alert.
    /// An id is recorded as shown before its presenter task runs, so a row
    /// alerts at most once per session however its presentation resolves.
    fn trigger_alerts(&mut self, visible: &[Notification]) {
        let presenter = match self.alert_presenter.read() {
            Ok(g) => g.clone(),
            Err(poison) => poison.into_inner().clone(),
        };
        let Some(presenter) = presenter else {
            let skipped = visible
                .iter()
                .filter(|n| !n.is_read && !self.shown_alerts.contains(&n.id))
                .count();
            if skipped > 0 {
                tracing::debug!(skipped, "alerts unavailable (no presenter installed)");
            }
            return;
        };

        for n in visible {
            if n.is_read || self.shown_alerts.contains(&n.id) {
                continue;
            }
            self.shown_alerts.insert(n.id.clone());
            let request = AlertRequest {
                title: n.title.clone(),
                body: n.body.clone(),
                icon: icon_for(n.kind),
                tag: n.id.clone(),
                require_interaction: false,
                link: n.link.clone(),
            };
            self.spawn_alert(presenter.clone(), request);
        }
    }

    fn spawn_alert(&self, presenter: Arc<dyn AlertPresenter>, request: AlertRequest) {
        let timeout = self.alert_timeout();
        let epoch = self.session_epoch;
        let id = request.tag.clone();
        let link = request.link.clone();
        let tx = self.core_sender.clone();
        tracing::info!(%id, "presenting alert");
        self.runtime.spawn(async move {
            let outcome = match tokio::time::timeout(timeout, presenter.present(request)).await {
                Ok(outcome) => outcome,
                Err(_) => AlertOutcome::TimedOut,
            };
            let event = InternalEvent::AlertResolved {
                epoch,
                id,
                link,
                outcome,
            };
            let _ = tx.send(CoreMsg::Internal(Box::new(event)));
        });
    }

    pub(super) fn apply_alert_resolution(
        &mut self,
        epoch: u64,
        id: &str,
        link: Option<String>,
        outcome: AlertOutcome,
    ) {
        if epoch != self.session_epoch {
            tracing::debug!(id, "alert resolution from a torn-down session ignored");
            return;
        }
        match outcome {
            AlertOutcome::Clicked => {
                tracing::info!(id, "alert clicked");
                let Some(link) = link else {
                    return;
                };
                let navigator = match self.navigator.read() {
                    Ok(g) => g.clone(),
                    Err(poison) => poison.into_inner().clone(),
                };
                match navigator {
                    Some(nav) => nav.navigate(&link),
                    None => tracing::debug!(%link, "alert link with no navigator installed"),
                }
            }
            AlertOutcome::Closed => tracing::debug!(id, "alert dismissed"),
            AlertOutcome::TimedOut => tracing::debug!(id, "alert timed out"),
            AlertOutcome::Error { message } => {
                tracing::warn!(id, %message, "alert presentation failed")
            }
        }
    }

    pub(super) fn rebuild_notifications(&mut self) {
        let mut list: Vec<NotificationView> = self
            .notifications
            .iter()
            .map(|n| NotificationView {
                id: n.id.clone(),
                kind: n.kind,
                title: n.title.clone(),
                body: n.body.clone(),
                is_read: n.is_read,
                link: n.link.clone(),
                created_at: n.created_at,
                actor: n.actor.clone(),
                icon: icon_for(n.kind),
            })
            .collect();
        list.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.cmp(&b.id)));
        self.state.notifications = list;
    }
}
