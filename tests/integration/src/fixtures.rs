//! Test fixtures
//!
//! Connection parameters and client tuning shared by the tests.

use fleetlink_common::{ClientConfig, ServerParameters};
use std::time::Duration;

pub const TEST_PROCESS_ID: &str = "proc-int-1";
pub const TEST_HOST_ID: &str = "host-int-1";
pub const TEST_FLEET_ID: &str = "fleet-int-1";
pub const TEST_AUTH_TOKEN: &str = "token-int-1";

/// Parameters pointing at `url`
pub fn test_params(url: &str) -> ServerParameters {
    ServerParameters::new(url, TEST_PROCESS_ID, TEST_HOST_ID, TEST_FLEET_ID, TEST_AUTH_TOKEN)
}

/// Client tuning with short retries and timeouts
pub fn fast_config() -> ClientConfig {
    ClientConfig {
        max_connect_retries: 1,
        initial_connect_backoff: Duration::from_millis(50),
        request_timeout: Duration::from_secs(5),
        shutdown_grace: Duration::from_millis(10),
        ..ClientConfig::default()
    }
}

/// A ws:// URL with nothing listening behind it
pub async fn unused_local_url() -> anyhow::Result<String> {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("ws://{addr}"))
}
