//! Signal-of-Stop: cooperative cancellation primitive.
//!
//! A cloneable async-aware token: cancelling any clone wakes every waiter.
//! Used to tear down the channel task and the UI loop together on Ctrl+C
//! or `q`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

/// A cooperative cancellation token. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct SignalOfStop {
    shared: Arc<Shared>,
}

#[derive(Debug, Default)]
struct Shared {
    closing: AtomicBool,
    notify: Notify,
}

impl SignalOfStop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal cancellation to all waiters. Idempotent.
    pub fn cancel(&self) {
        self.shared.closing.store(true, Ordering::Release);
        self.shared.notify.notify_waiters();
    }

    /// Whether cancellation has been signalled.
    pub fn cancelled(&self) -> bool {
        self.shared.closing.load(Ordering::Acquire)
    }

    /// Wait until cancellation is signalled. Returns immediately when it
    /// already was.
    pub async fn wait(&self) {
        while !self.cancelled() {
            let notified = self.shared.notify.notified();
            if self.cancelled() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let sos = SignalOfStop::new();
        let other = sos.clone();
        assert!(!other.cancelled());
        sos.cancel();
        assert!(other.cancelled());
    }

    #[tokio::test]
    async fn wait_returns_after_cancel() {
        let sos = SignalOfStop::new();
        let waiter = sos.clone();
        let handle = tokio::spawn(async move { waiter.wait().await });
        sos.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn wait_on_already_cancelled_is_immediate() {
        let sos = SignalOfStop::new();
        sos.cancel();
        sos.wait().await;
    }
}
