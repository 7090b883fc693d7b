use std::time::Duration;
use tokio::sync::watch;

/// Process-wide shutdown flag, shared by every streaming session.
///
/// Sessions hold a `watch::Receiver<bool>` and check it between ticks; the
/// server raises it once on Ctrl-C.
#[derive(Clone)]
pub struct Context {
    pub tx: watch::Sender<bool>,
}

impl Context {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// A receiver for one new session.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Asks every session to stop after its current tick.
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.tx.borrow()
    }

    /// Waits until every session has dropped its receiver, or `grace` runs out.
    /// Returns `true` if all sessions finished in time.
    pub async fn drained(&self, grace: Duration) -> bool {
        tokio::time::timeout(grace, self.tx.closed()).await.is_ok()
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_reaches_subscribers() {
        let ctx = Context::new();
        let mut rx = ctx.subscribe();
        assert!(!*rx.borrow());

        ctx.shutdown();
        rx.changed().await.unwrap();
        assert!(*rx.borrow());
        assert!(ctx.is_shutting_down());
    }

    #[tokio::test(start_paused = true)]
    async fn drained_waits_for_receivers() {
        let ctx = Context::new();
        let rx = ctx.subscribe();
        assert!(!ctx.drained(Duration::from_millis(100)).await);

        drop(rx);
        assert!(ctx.drained(Duration::from_millis(100)).await);
    }
}
