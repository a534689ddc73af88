//! The minimum-dwell gate: one cancellable delayed action.

use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

/// Schedules a single delayed callback that can be cancelled until the
/// moment it starts running.
///
/// Cancellation is idempotent, and the callback removes its own handle
/// before executing: a cancel issued from *inside* the callback (the
/// continue-enable path cancels the gate unconditionally) must not abort
/// the callback itself mid-flight.
#[derive(Default)]
pub struct DwellGate {
    inner: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl DwellGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules `callback` to run after `duration`. A previously pending
    /// schedule is cancelled first.
    pub fn schedule<F>(&self, duration: Duration, callback: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            inner.lock().unwrap().take();
            callback.await;
        });
        *self.inner.lock().unwrap() = Some(handle);
    }

    /// Cancels the pending callback, if any. Safe to call repeatedly.
    pub fn cancel(&self) {
        if let Some(handle) = self.inner.lock().unwrap().take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.lock().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_fires_exactly_once_after_duration() {
        let gate = DwellGate::new();
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        gate.schedule(Duration::from_secs(30), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(gate.is_pending());

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(!gate.is_pending());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing_and_is_idempotent() {
        let gate = DwellGate::new();
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        gate.schedule(Duration::from_secs(30), async move {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        gate.cancel();
        gate.cancel();
        assert!(!gate.is_pending());

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_callback_may_cancel_its_own_gate() {
        let gate = Arc::new(DwellGate::new());
        let fired = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&fired);
        let gate_in_callback = Arc::clone(&gate);
        gate.schedule(Duration::from_secs(5), async move {
            gate_in_callback.cancel();
            tokio::task::yield_now().await;
            counter.fetch_add(1, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(
            fired.load(Ordering::SeqCst),
            1,
            "self-cancel must not abort the running callback"
        );
    }
}
