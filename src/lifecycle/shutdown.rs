//! Shutdown coordination.
//!
//! Backed by the same [`CancellationToken`] the request contexts use, so a
//! trigger is sticky: waiters that arrive after it still see it.

use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

/// Process-wide stop switch. Clones share one token.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    token: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// A future that resolves once [`Shutdown::trigger`] has been called.
    pub fn subscribe(&self) -> WaitForCancellationFutureOwned {
        self.token.clone().cancelled_owned()
    }

    /// Stop everything waiting on this switch. Idempotent.
    pub fn trigger(&self) {
        self.token.cancel();
    }

    pub fn is_triggered(&self) -> bool {
        self.token.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn trigger_reaches_every_clone() {
        let shutdown = Shutdown::new();
        let a = shutdown.subscribe();
        let b = shutdown.clone().subscribe();
        assert!(!shutdown.is_triggered());

        shutdown.clone().trigger();

        tokio::time::timeout(Duration::from_secs(1), async {
            a.await;
            b.await;
        })
        .await
        .unwrap();
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn late_subscriber_sees_earlier_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), shutdown.subscribe())
            .await
            .unwrap();
    }
}
