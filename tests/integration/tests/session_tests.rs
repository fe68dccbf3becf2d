//! Session Integration Tests
//!
//! Drive the client against a local WebSocket endpoint.
//!
//! Run with: cargo test -p integration-tests --test session_tests

use std::sync::Arc;
use std::time::Duration;

use fleetlink_client::{ProcessParameters, ServerState, WebSocketTransport};
use fleetlink_core::{FleetError, GameSession};
use integration_tests::{fast_config, test_params, unused_local_url, TestServer, TEST_FLEET_ID};
use serde_json::json;
use tokio::sync::mpsc;

fn new_state() -> ServerState {
    ServerState::new(
        Arc::new(WebSocketTransport::with_handshake_timeout(Duration::from_secs(2))),
        fast_config(),
    )
}

// ============================================================================
// Connection Tests
// ============================================================================

#[tokio::test]
async fn test_connect_sends_identity_in_query() {
    let server = TestServer::start().await.expect("Failed to start endpoint");
    let state = new_state();

    state
        .init_sdk(test_params(&server.url()))
        .await
        .expect("Connect failed");

    let uris = server.uris();
    assert_eq!(uris.len(), 1);
    assert!(uris[0].starts_with("/?pID=proc-int-1&"), "{}", uris[0]);
    assert!(uris[0].contains("sdkLanguage=Rust"));
    assert!(uris[0].contains("Authorization=token-int-1"));
    assert!(uris[0].contains("ComputeId=host-int-1"));
    assert!(uris[0].contains("FleetId=fleet-int-1"));
}

#[tokio::test]
async fn test_forbidden_handshake_is_connect_forbidden() {
    let server = TestServer::start_rejecting(403)
        .await
        .expect("Failed to start endpoint");
    let state = new_state();

    let result = state.init_sdk(test_params(&server.url())).await;

    assert_eq!(result, Err(FleetError::ConnectForbidden));
    // first attempt plus one retry
    assert_eq!(server.uris().len(), 2);
}

#[tokio::test]
async fn test_unreachable_endpoint_is_connect_timeout() {
    let url = unused_local_url().await.expect("Failed to pick a port");
    let state = new_state();

    let result = state.init_sdk(test_params(&url)).await;

    assert_eq!(result, Err(FleetError::ConnectTimeout));
}

// ============================================================================
// Session Flow Tests
// ============================================================================

#[tokio::test]
async fn test_full_session_flow() {
    let server = TestServer::start().await.expect("Failed to start endpoint");
    let state = new_state();
    state
        .init_sdk(test_params(&server.url()))
        .await
        .expect("Connect failed");

    let (tx, mut sessions) = mpsc::unbounded_channel();
    let parameters = ProcessParameters::new()
        .on_start_game_session(move |game_session: GameSession| {
            let tx = tx.clone();
            async move {
                let _ = tx.send(game_session);
            }
        })
        .port(7777);
    state
        .process_ready(parameters)
        .await
        .expect("ProcessReady failed");

    let activate = server
        .wait_for_action("ActivateServerProcess", 1)
        .await
        .expect("No activation");
    assert_eq!(activate["Port"], 7777);
    assert_eq!(activate["SdkLanguage"], "Rust");

    assert!(server.push(&json!({
        "Action": "CreateGameSession",
        "GameSessionId": "gsess-int-1",
        "MaximumPlayerSessionCount": 8
    })));
    let game_session = tokio::time::timeout(Duration::from_secs(5), sessions.recv())
        .await
        .expect("No session callback")
        .expect("Callback channel closed");
    assert_eq!(game_session.game_session_id, "gsess-int-1");
    assert_eq!(game_session.fleet_id, TEST_FLEET_ID);

    state
        .activate_game_session()
        .await
        .expect("ActivateGameSession failed");
    state
        .accept_player_session("psess-int-1")
        .await
        .expect("AcceptPlayerSession failed");

    let accept = server
        .wait_for_action("AcceptPlayerSession", 1)
        .await
        .expect("No accept");
    assert_eq!(accept["GameSessionId"], "gsess-int-1");

    state.process_ending().await.expect("ProcessEnding failed");
    state.shutdown().await.expect("Shutdown failed");
    assert!(!state.is_process_ready());
}

#[tokio::test]
async fn test_service_errors_reach_the_caller() {
    let server = TestServer::start().await.expect("Failed to start endpoint");
    server.set_responder(|frame| {
        Some(json!({
            "Action": frame["Action"],
            "RequestId": frame["RequestId"],
            "StatusCode": 500,
            "ErrorMessage": "service unavailable",
        }))
    });
    let state = new_state();
    state
        .init_sdk(test_params(&server.url()))
        .await
        .expect("Connect failed");

    let result = state.process_ready(ProcessParameters::new()).await;

    assert_eq!(
        result,
        Err(FleetError::InternalService("service unavailable".into()))
    );
}

#[tokio::test]
async fn test_refresh_connection_moves_to_new_endpoint() {
    let first = TestServer::start().await.expect("Failed to start endpoint");
    let second = TestServer::start().await.expect("Failed to start endpoint");
    let state = new_state();
    state
        .init_sdk(test_params(&first.url()))
        .await
        .expect("Connect failed");

    assert!(first.push(&json!({
        "Action": "RefreshConnection",
        "RefreshConnectionEndpoint": second.url(),
        "AuthToken": "token-int-2"
    })));
    second
        .wait_for_connections(1)
        .await
        .expect("Client never reconnected");
    assert!(second.uris()[0].contains("Authorization=token-int-2"));
    // The previous connection is closed only after the new one took over.
    first
        .wait_for_disconnects(1)
        .await
        .expect("Previous connection was never closed");

    state
        .process_ready(ProcessParameters::new())
        .await
        .expect("ProcessReady failed");
    second
        .wait_for_action("ActivateServerProcess", 1)
        .await
        .expect("Request did not use the new endpoint");
    assert!(first.received_actions().is_empty());
}

#[tokio::test]
async fn test_shutdown_closes_connection() {
    let server = TestServer::start().await.expect("Failed to start endpoint");
    let state = new_state();
    state
        .init_sdk(test_params(&server.url()))
        .await
        .expect("Connect failed");

    state.shutdown().await.expect("Shutdown failed");

    server
        .wait_for_disconnects(1)
        .await
        .expect("Connection stayed open after shutdown");
}
