use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::AbortHandle;
use tracing::debug;

/// Identifies one outstanding request. Only the most recently issued ticket of
/// a gate is current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

/// Issues monotonically increasing tickets so late responses can be told apart
/// from the latest one.
#[derive(Debug, Default)]
pub struct RequestGate {
    latest: AtomicU64,
}

impl RequestGate {
    pub fn issue(&self) -> Ticket {
        Ticket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// Makes every ticket issued so far stale.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}

/// Runs a task after a quiet period. Scheduling again before the period ends
/// aborts the pending task, so only the last request in a burst fires.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    gate: RequestGate,
    pending: Option<AbortHandle>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            gate: RequestGate::default(),
            pending: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn schedule<F, Fut>(&mut self, task: F) -> Ticket
    where
        F: FnOnce(Ticket) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.abort_pending();
        let ticket = self.gate.issue();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            task(ticket).await;
        });
        self.pending = Some(handle.abort_handle());
        debug!(?ticket, ?delay, "debounced task scheduled");
        ticket
    }

    /// Aborts the pending task and makes any result already in flight stale.
    pub fn cancel(&mut self) {
        self.abort_pending();
        self.gate.invalidate();
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.gate.is_current(ticket)
    }

    fn abort_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
