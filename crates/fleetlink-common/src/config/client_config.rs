//! Client tunables
//!
//! Defaults match the orchestration protocol; `FLEETLINK_*` variables
//! override them for testing against local endpoints.

use std::env;
use std::time::Duration;

use super::ConfigError;

/// Timing and capacity knobs for the fleet client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Retries after the first failed connect attempt
    pub max_connect_retries: u32,
    /// Delay before the first retry, doubled for each following one
    pub initial_connect_backoff: Duration,
    /// How many times `disconnect` polls a closing channel
    pub disconnect_poll_attempts: u32,
    pub disconnect_poll_interval: Duration,
    /// Default timeout for correlated requests
    pub request_timeout: Duration,
    pub health_check_interval: Duration,
    /// Maximum jitter added to or subtracted from the interval
    pub health_check_max_jitter: Duration,
    /// Pause between clearing readiness and disconnecting on shutdown
    pub shutdown_grace: Duration,
    /// Start/update/terminate callbacks allowed to run at once; further ones are dropped
    pub callback_queue_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            max_connect_retries: default_max_connect_retries(),
            initial_connect_backoff: Duration::from_secs(2),
            disconnect_poll_attempts: 5,
            disconnect_poll_interval: Duration::from_millis(200),
            request_timeout: Duration::from_secs(20),
            health_check_interval: Duration::from_secs(60),
            health_check_max_jitter: Duration::from_secs(10),
            shutdown_grace: Duration::from_secs(1),
            callback_queue_capacity: default_callback_queue_capacity(),
        }
    }
}

fn default_max_connect_retries() -> u32 {
    5
}

fn default_callback_queue_capacity() -> usize {
    256
}

fn millis(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    lookup(key)
        .and_then(|s| s.parse().ok())
        .map(Duration::from_millis)
}

impl ClientConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    /// Returns an error if the resulting tunables are inconsistent
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let config = Self {
            max_connect_retries: lookup("FLEETLINK_MAX_CONNECT_RETRIES")
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_max_connect_retries),
            initial_connect_backoff: millis(&lookup, "FLEETLINK_CONNECT_BACKOFF_MS")
                .unwrap_or(defaults.initial_connect_backoff),
            request_timeout: millis(&lookup, "FLEETLINK_REQUEST_TIMEOUT_MS")
                .unwrap_or(defaults.request_timeout),
            health_check_interval: millis(&lookup, "FLEETLINK_HEALTH_CHECK_INTERVAL_MS")
                .unwrap_or(defaults.health_check_interval),
            health_check_max_jitter: millis(&lookup, "FLEETLINK_HEALTH_CHECK_JITTER_MS")
                .unwrap_or(defaults.health_check_max_jitter),
            shutdown_grace: millis(&lookup, "FLEETLINK_SHUTDOWN_GRACE_MS")
                .unwrap_or(defaults.shutdown_grace),
            callback_queue_capacity: lookup("FLEETLINK_CALLBACK_QUEUE_CAPACITY")
                .and_then(|s| s.parse().ok())
                .unwrap_or_else(default_callback_queue_capacity),
            ..defaults
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.health_check_max_jitter >= self.health_check_interval {
            return Err(ConfigError::InvalidValue(
                "FLEETLINK_HEALTH_CHECK_JITTER_MS",
                format!(
                    "jitter {:?} must be below the interval {:?}",
                    self.health_check_max_jitter, self.health_check_interval
                ),
            ));
        }
        if self.callback_queue_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "FLEETLINK_CALLBACK_QUEUE_CAPACITY",
                "must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue(
                "FLEETLINK_REQUEST_TIMEOUT_MS",
                "must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Time the health callback gets before the process is reported unhealthy
    #[must_use]
    pub fn health_check_timeout(&self) -> Duration {
        self.health_check_interval
            .saturating_sub(self.health_check_max_jitter)
    }

    /// Upper bound on the time `connect` spends in backoff
    #[must_use]
    pub fn max_total_backoff(&self) -> Duration {
        (0..self.max_connect_retries)
            .map(|retry| self.initial_connect_backoff.saturating_mul(1 << retry.min(16)))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}
