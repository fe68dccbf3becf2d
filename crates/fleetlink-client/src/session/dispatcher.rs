//! Callback dispatcher
//!
//! Session-event callbacks run detached from the inbound dispatch task. At
//! most `capacity` callbacks are in flight; past that, new ones are dropped
//! with a warning rather than stalling inbound frames. Panics are caught and
//! logged.

use futures::future::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Fire-and-forget runner for application callbacks
pub(crate) struct CallbackDispatcher {
    permits: Arc<Semaphore>,
}

impl CallbackDispatcher {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(capacity.max(1))),
        }
    }

    /// Run `future` in the background; false if it was dropped.
    ///
    /// Must be called within a tokio runtime.
    pub(crate) fn dispatch<F>(&self, name: &'static str, future: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Ok(permit) = Arc::clone(&self.permits).try_acquire_owned() else {
            tracing::warn!(callback = name, "Too many callbacks in flight, dropping callback");
            return false;
        };

        tokio::spawn(async move {
            run_callback(name, future).await;
            drop(permit);
        });
        true
    }
}

async fn run_callback<F>(name: &'static str, future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    tracing::trace!(callback = name, "Running callback");

    if AssertUnwindSafe(future).catch_unwind().await.is_err() {
        tracing::error!(callback = name, "Callback panicked");
    }
}
