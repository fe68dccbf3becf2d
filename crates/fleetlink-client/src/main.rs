//! Demo game server process
//!
//! Run with:
//! ```bash
//! cargo run -p fleetlink-client --bin fleetlink-demo
//! ```
//!
//! Connection parameters come from the `GAMELIFT_SDK_*` environment
//! variables; client tuning from `FLEETLINK_*`.

use fleetlink_client::{LogParameters, ProcessParameters, ServerState, WebSocketTransport};
use fleetlink_common::{
    try_init_tracing_with_config, ClientConfig, ServerParameters, TracingConfig,
};
use std::sync::Arc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() {
    // Initialize tracing
    if let Err(e) = try_init_tracing_with_config(TracingConfig::from_env()) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    if let Err(e) = run().await {
        error!(error = %e, "Demo server failed");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting demo game server...");

    let config = ClientConfig::from_env()?;
    let port: i32 = std::env::var("FLEETLINK_DEMO_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(7777);

    let state = ServerState::new(Arc::new(WebSocketTransport::new()), config);
    state.init_sdk(ServerParameters::from_env()?).await?;

    let session_state = state.clone();
    let terminate_state = state.clone();
    let parameters = ProcessParameters::new()
        .on_start_game_session(move |game_session| {
            let state = session_state.clone();
            async move {
                info!(
                    game_session_id = %game_session.game_session_id,
                    max_players = game_session.maximum_player_session_count,
                    "Hosting game session"
                );
                if let Err(e) = state.activate_game_session().await {
                    warn!(error = %e, "Failed to activate game session");
                }
            }
        })
        .on_update_game_session(|update| async move {
            info!(
                game_session_id = %update.game_session.game_session_id,
                reason = %update.update_reason,
                "Game session updated"
            );
        })
        .on_process_terminate(move || {
            let state = terminate_state.clone();
            async move {
                info!(termination_time = ?state.termination_time().ok(), "Termination requested");
                if let Err(e) = state.process_ending().await {
                    warn!(error = %e, "Failed to report process ending");
                }
            }
        })
        .on_health_check(|| async { true })
        .port(port)
        .log_parameters(LogParameters::new(["logs/demo.log"]));

    state.process_ready(parameters).await?;
    info!(port, "Ready for game sessions, press Ctrl+C to stop");

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    if state.is_process_ready() {
        if let Err(e) = state.process_ending().await {
            warn!(error = %e, "Failed to report process ending");
        }
    }
    state.shutdown().await?;

    Ok(())
}
