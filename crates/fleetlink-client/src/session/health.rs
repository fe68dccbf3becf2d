//! Health-check loop
//!
//! Sleeps a jittered interval, polls the health callback under a timeout
//! and reports the answer as a heartbeat. Send failures are logged and left
//! to the next beat.

use rand::Rng;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use super::process_parameters::HealthCheckCallback;
use crate::correlator::RequestCorrelator;
use crate::protocol::OutboundMessage;

/// `interval` shifted by a uniform offset in `[-max_jitter, max_jitter]`
pub(crate) fn jittered_interval(interval: Duration, max_jitter: Duration) -> Duration {
    if max_jitter.is_zero() {
        return interval;
    }
    let jitter_ms = i64::try_from(max_jitter.as_millis()).unwrap_or(i64::MAX);
    let interval_ms = i64::try_from(interval.as_millis()).unwrap_or(i64::MAX);
    let offset = rand::thread_rng().gen_range(-jitter_ms..=jitter_ms);

    Duration::from_millis(u64::try_from(interval_ms.saturating_add(offset)).unwrap_or(0))
}

pub(crate) struct HealthMonitor {
    pub(crate) ready: Arc<AtomicBool>,
    pub(crate) correlator: Arc<RequestCorrelator>,
    pub(crate) callback: HealthCheckCallback,
    pub(crate) interval: Duration,
    pub(crate) max_jitter: Duration,
    pub(crate) timeout: Duration,
}

/// Stops the loop when dropped
pub(crate) struct HealthHandle {
    stop: Arc<Notify>,
}

impl HealthHandle {
    pub(crate) fn stop(self) {
        drop(self);
    }
}

impl Drop for HealthHandle {
    fn drop(&mut self) {
        self.stop.notify_one();
    }
}

impl HealthMonitor {
    pub(crate) fn spawn(self) -> HealthHandle {
        let stop = Arc::new(Notify::new());
        tokio::spawn(self.run(Arc::clone(&stop)));
        HealthHandle { stop }
    }

    async fn run(self, stop: Arc<Notify>) {
        tracing::debug!(
            interval_ms = self.interval.as_millis() as u64,
            timeout_ms = self.timeout.as_millis() as u64,
            "Health check loop started"
        );

        loop {
            let delay = jittered_interval(self.interval, self.max_jitter);
            tokio::select! {
                () = stop.notified() => break,
                () = tokio::time::sleep(delay) => {}
            }

            if !self.is_ready() {
                break;
            }
            let healthy = self.check().await;
            if !self.is_ready() {
                break;
            }

            match self
                .correlator
                .send_request(OutboundMessage::heartbeat(healthy))
                .await
            {
                Ok(_) => tracing::debug!(healthy, "Heartbeat sent"),
                Err(e) => tracing::warn!(healthy, error = %e, "Failed to send heartbeat"),
            }
        }

        tracing::debug!("Health check loop stopped");
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Run the callback on its own task so a hung callback can be abandoned
    async fn check(&self) -> bool {
        let callback = Arc::clone(&self.callback);
        let mut task = tokio::spawn(async move { callback().await });

        match tokio::time::timeout(self.timeout, &mut task).await {
            Ok(Ok(healthy)) => healthy,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "Health check callback failed");
                false
            }
            Err(_) => {
                task.abort();
                tracing::warn!(
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Health check callback timed out"
                );
                false
            }
        }
    }
}
