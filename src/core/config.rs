use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::InboxCore;

const DEFAULT_THREAD_POLL_MS: u64 = 30_000;
const DEFAULT_NOTIFICATION_POLL_MS: u64 = 10_000;
const DEFAULT_CONVERSATION_POLL_MS: u64 = 10_000;
const DEFAULT_ALERT_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_CONVERSATION_PAGE_SIZE: u32 = 50;
const DEFAULT_NOTIFICATION_LIMIT: u32 = 20;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(super) struct InboxConfig {
    pub(super) thread_poll_ms: Option<u64>,
    pub(super) notification_poll_ms: Option<u64>,
    pub(super) conversation_poll_ms: Option<u64>,
    pub(super) alert_timeout_ms: Option<u64>,
    pub(super) conversation_page_size: Option<u32>,
    pub(super) notification_limit: Option<u32>,
}

pub(super) fn load_inbox_config(data_dir: &str) -> InboxConfig {
    let path = Path::new(data_dir).join("inbox_config.json");
    let Ok(bytes) = std::fs::read(&path) else {
        return InboxConfig::default();
    };
    serde_json::from_slice::<InboxConfig>(&bytes).unwrap_or_default()
}

impl InboxCore {
    pub(super) fn thread_poll_period(&self) -> Duration {
        millis(self.config.thread_poll_ms, DEFAULT_THREAD_POLL_MS)
    }

    pub(super) fn notification_poll_period(&self) -> Duration {
        millis(self.config.notification_poll_ms, DEFAULT_NOTIFICATION_POLL_MS)
    }

    pub(super) fn conversation_poll_period(&self) -> Duration {
        millis(self.config.conversation_poll_ms, DEFAULT_CONVERSATION_POLL_MS)
    }

    pub(super) fn alert_timeout(&self) -> Duration {
        millis(self.config.alert_timeout_ms, DEFAULT_ALERT_TIMEOUT_MS)
    }

    pub(super) fn conversation_page_size(&self) -> u32 {
        self.config
            .conversation_page_size
            .unwrap_or(DEFAULT_CONVERSATION_PAGE_SIZE)
            .max(1)
    }

    pub(super) fn notification_limit(&self) -> u32 {
        self.config
            .notification_limit
            .unwrap_or(DEFAULT_NOTIFICATION_LIMIT)
            .max(1)
    }
}

// `tokio::time::interval` panics on a zero period; clamp to 1ms.
fn millis(configured: Option<u64>, default: u64) -> Duration {
    Duration::from_millis(configured.unwrap_or(default).max(1))
}
