//! Request gate: counts arrivals and optionally holds them until released.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{watch, Semaphore};

pub(crate) struct Gate {
    held: AtomicBool,
    permits: Semaphore,
    arrived: watch::Sender<usize>,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Self {
            held: AtomicBool::new(false),
            permits: Semaphore::new(0),
            arrived: watch::channel(0).0,
        }
    }

    /// Hold every request arriving from now on until [`Gate::release`].
    pub(crate) fn hold(&self) {
        self.held.store(true, Ordering::SeqCst);
    }

    /// Let `n` held requests through.
    pub(crate) fn release(&self, n: usize) {
        self.permits.add_permits(n);
    }

    pub(crate) fn arrivals(&self) -> usize {
        *self.arrived.borrow()
    }

    /// Resolves once at least `n` requests have arrived.
    pub(crate) async fn wait_for(&self, n: usize) {
        let mut rx = self.arrived.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|count| *count >= n).await;
    }

    /// Called at the start of every request.
    pub(crate) async fn pass(&self) {
        let held = self.held.load(Ordering::SeqCst);
        self.arrived.send_modify(|count| *count += 1);
        if held {
            if let Ok(permit) = self.permits.acquire().await {
                permit.forget();
            }
        }
    }
}
