//! Cooperative cancellation shared between a session and its callers.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Result of racing a future against cancellation.
#[derive(Debug, PartialEq, Eq)]
pub enum Raced<T> {
    Completed(T),
    Cancelled,
}

/// Cancellation flag plus the token that aborts in-flight collaborator calls.
///
/// Cloning shares the same state. After [`CancelContext::cancel`] the flag
/// stays raised until [`CancelContext::clear_after_cooldown`] installs a
/// fresh token generation.
#[derive(Clone, Debug)]
pub struct CancelContext {
    inner: Arc<CancelInner>,
}

#[derive(Debug)]
struct CancelInner {
    flag: AtomicBool,
    generation: AtomicU64,
    token: Mutex<CancellationToken>,
    cooldown: Duration,
}

impl CancelContext {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            inner: Arc::new(CancelInner {
                flag: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                token: Mutex::new(CancellationToken::new()),
                cooldown,
            }),
        }
    }

    /// Raise the flag and abort whatever is waiting on the current token.
    pub fn cancel(&self) {
        if !self.inner.flag.swap(true, Ordering::SeqCst) {
            info!(generation = self.generation(), "cancellation requested");
        }
        self.inner.token.lock().cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Token of the current generation.
    pub fn token(&self) -> CancellationToken {
        self.inner.token.lock().clone()
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    pub fn cooldown(&self) -> Duration {
        self.inner.cooldown
    }

    /// Wait out the cooldown, then lower the flag with a fresh token.
    ///
    /// A cancel raised during the cooldown is folded into the same reset.
    pub async fn clear_after_cooldown(&self) {
        tokio::time::sleep(self.inner.cooldown).await;
        let mut token = self.inner.token.lock();
        *token = CancellationToken::new();
        self.inner.flag.store(false, Ordering::SeqCst);
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        debug!(generation, "cancellation cleared");
    }

    /// Run `future` unless the current token fires first.
    pub async fn race<F, T>(&self, future: F) -> Raced<T>
    where
        F: Future<Output = T>,
    {
        if self.is_cancelled() {
            return Raced::Cancelled;
        }
        let token = self.token();
        tokio::select! {
            biased;
            _ = token.cancelled() => Raced::Cancelled,
            value = future => Raced::Completed(value),
        }
    }
}

impl Default for CancelContext {
    fn default() -> Self {
        Self::new(Duration::from_millis(500))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn cancel_aborts_pending_race() {
        let cancel = CancelContext::default();
        let racer = cancel.clone();
        let pending = tokio::spawn(async move {
            racer
                .race(tokio::time::sleep(Duration::from_secs(60)))
                .await
        });
        tokio::task::yield_now().await;
        cancel.cancel();
        assert_eq!(pending.await.unwrap(), Raced::Cancelled);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn flag_clears_after_cooldown_with_new_token() {
        let cancel = CancelContext::new(Duration::from_millis(500));
        cancel.cancel();
        let old = cancel.token();
        cancel.clear_after_cooldown().await;

        assert!(!cancel.is_cancelled());
        assert!(old.is_cancelled());
        assert!(!cancel.token().is_cancelled());
        assert_eq!(cancel.generation(), 1);
        assert_eq!(cancel.race(async { 7 }).await, Raced::Completed(7));
    }
}
