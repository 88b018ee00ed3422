use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Runs the most recently scheduled action once `delay` has passed without a newer
/// schedule.
///
/// Each pending action holds its own cancellation token; scheduling again cancels it.
/// Cancellation only reaches an action that is still waiting: once its delay has
/// elapsed the action runs to completion. Timing follows tokio's clock, so tests drive
/// it with a paused runtime.
pub struct Debouncer {
    delay: Duration,
    pending: Mutex<Option<CancellationToken>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: Mutex::new(None),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Schedules `action`, superseding any action still waiting.
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule<F>(&self, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        if let Some(previous) = self.replace_pending(Some(token.clone())) {
            previous.cancel();
        }

        let delay = self.delay;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            // No longer pending
            token.cancel();
            action.await;
        });
    }

    /// Drops the waiting action, if any
    pub fn cancel(&self) {
        if let Some(previous) = self.replace_pending(None) {
            previous.cancel();
        }
    }

    /// Whether an action is still waiting for its delay to pass
    pub fn is_pending(&self) -> bool {
        self.pending
            .lock()
            .map(|pending| pending.as_ref().is_some_and(|t| !t.is_cancelled()))
            .unwrap_or(false)
    }

    fn replace_pending(&self, token: Option<CancellationToken>) -> Option<CancellationToken> {
        match self.pending.lock() {
            Ok(mut pending) => std::mem::replace(&mut *pending, token),
            Err(poisoned) => std::mem::replace(&mut *poisoned.into_inner(), token),
        }
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}
