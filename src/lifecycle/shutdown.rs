//! Shutdown latch shared by the server and the signal handler.
//!
//! Once triggered it stays triggered, so a server that starts waiting after
//! the trigger (e.g. a signal during startup) still stops.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// One-way shutdown latch. Clones share the same state.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Request shutdown. Returns `false` if it had already been requested.
    pub fn trigger(&self) -> bool {
        let first = self.tx.send_if_modified(|triggered| !std::mem::replace(triggered, true));
        if first {
            tracing::info!("Shutdown requested");
        }
        first
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once [`Shutdown::trigger`] has been called, including calls
    /// made before this future was created.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            // The sender lives as long as any clone, and this future holds
            // none, so a closed channel also means no trigger can follow.
            let _ = rx.wait_for(|triggered| *triggered).await;
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_reaches_every_waiter() {
        let shutdown = Shutdown::new();
        let first = tokio::spawn(shutdown.signalled());
        let second = tokio::spawn(shutdown.clone().signalled());

        assert!(shutdown.trigger());
        first.await.unwrap();
        second.await.unwrap();
    }

    #[tokio::test]
    async fn test_late_waiter_sees_earlier_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), shutdown.signalled())
            .await
            .expect("late waiter should resolve immediately");
    }

    #[tokio::test]
    async fn test_untriggered_waiter_stays_pending() {
        let shutdown = Shutdown::new();
        let outcome = tokio::time::timeout(Duration::from_millis(20), shutdown.signalled()).await;
        assert!(outcome.is_err());
        assert!(!shutdown.is_triggered());
    }

    #[test]
    fn test_trigger_is_idempotent() {
        let shutdown = Shutdown::new();
        assert!(shutdown.trigger());
        assert!(!shutdown.clone().trigger());
        assert!(shutdown.is_triggered());
    }
}
