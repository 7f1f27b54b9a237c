use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Issue/admit guard for one polled data source.
///
/// Every outgoing request stamps itself from the shared issue counter; the
/// event loop admits a response only if it still carries the newest issued
/// sequence. Anything that raced with a newer request, a teardown, or a
/// conversation switch is discarded instead of regressing the view.
#[derive(Debug)]
pub(super) struct PollGate {
    issued: Arc<AtomicU64>,
    applied: u64,
}

/// Cheap handle for the request side; lives inside spawned tasks.
#[derive(Debug, Clone)]
pub(super) struct PollIssuer(Arc<AtomicU64>);

impl PollIssuer {
    pub(super) fn issue(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl PollGate {
    pub(super) fn new() -> Self {
        Self {
            issued: Arc::new(AtomicU64::new(0)),
            applied: 0,
        }
    }

    pub(super) fn issuer(&self) -> PollIssuer {
        PollIssuer(self.issued.clone())
    }

    /// Invalidates every request currently in flight.
    pub(super) fn invalidate(&mut self) {
        self.issued.fetch_add(1, Ordering::SeqCst);
    }

    /// True when `seq` is the newest issued request and has not been applied
    /// yet. Admitting records it, so a replay of the same response is
    /// rejected.
    pub(super) fn admit(&mut self, seq: u64) -> bool {
        if seq != self.issued.load(Ordering::SeqCst) || seq <= self.applied {
            return false;
        }
        self.applied = seq;
        true
    }
}
