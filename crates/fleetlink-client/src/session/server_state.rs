//! Server state
//!
//! The public entry point for a game server process. Turns caller actions
//! into correlated requests and inbound session events into callbacks.

use chrono::{DateTime, Utc};
use fleetlink_common::{ClientConfig, ServerParameters};
use fleetlink_core::{
    DescribePlayerSessionsRequest, DescribePlayerSessionsResult, FleetError, FleetResult,
    GameSession, GetComputeCertificateResult, GetFleetRoleCredentialsRequest,
    GetFleetRoleCredentialsResult, PlayerSessionCreationPolicy, StartMatchBackfillRequest,
    StartMatchBackfillResult, StopMatchBackfillRequest, UpdateGameSession,
};
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use super::credentials::{default_session_name, CredentialCache, MAX_ROLE_SESSION_NAME_LEN};
use super::dispatcher::CallbackDispatcher;
use super::health::{HealthHandle, HealthMonitor};
use super::process_parameters::{HealthCheckCallback, ProcessParameters};
use crate::connection::{ConnectionManager, MessageHandler};
use crate::correlator::RequestCorrelator;
use crate::protocol::{OutboundMessage, ResponsePayload};
use crate::transport::{ConnectionState, Transport};
use crate::{SDK_LANGUAGE, SDK_VERSION};

/// Page size used when a describe request sets no limit
pub const DEFAULT_DESCRIBE_LIMIT: u32 = 50;

/// Handle to the process's session state
///
/// Cheap to clone; every clone drives the same connection.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    connection: Arc<ConnectionManager>,
    correlator: Arc<RequestCorrelator>,
    config: ClientConfig,

    ready: Arc<AtomicBool>,
    identity: RwLock<Option<ServerParameters>>,
    game_session_id: RwLock<Option<String>>,
    termination_time: RwLock<Option<DateTime<Utc>>>,
    process_parameters: RwLock<Option<ProcessParameters>>,

    dispatcher: CallbackDispatcher,
    credentials: CredentialCache,
    health: Mutex<Option<HealthHandle>>,
}

impl ServerState {
    /// Create server state over `transport`.
    ///
    /// Must be called within a tokio runtime.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, config: ClientConfig) -> Self {
        let connection = ConnectionManager::new_shared(transport, &config);
        let correlator = RequestCorrelator::new_shared(connection.clone(), config.request_timeout);
        Self::with_components(connection, correlator, config)
    }

    /// Create server state over an existing connection and correlator
    #[must_use]
    pub fn with_components(
        connection: Arc<ConnectionManager>,
        correlator: Arc<RequestCorrelator>,
        config: ClientConfig,
    ) -> Self {
        let inner = Arc::new(ServerStateInner {
            connection,
            correlator,
            dispatcher: CallbackDispatcher::new(config.callback_queue_capacity),
            config,
            ready: Arc::new(AtomicBool::new(false)),
            identity: RwLock::new(None),
            game_session_id: RwLock::new(None),
            termination_time: RwLock::new(None),
            process_parameters: RwLock::new(None),
            credentials: CredentialCache::new(),
            health: Mutex::new(None),
        });

        let handler: Weak<dyn MessageHandler> = Arc::downgrade(&inner) as Weak<dyn MessageHandler>;
        inner.connection.set_handler(handler);

        Self { inner }
    }

    // === Lifecycle ===

    /// Connect to the orchestration endpoint.
    ///
    /// Environment overrides take precedence over `params`.
    pub async fn init_sdk(&self, params: ServerParameters) -> FleetResult<()> {
        let params = params.resolve()?;
        *self.inner.identity.write() = Some(params.clone());

        tracing::info!(
            process_id = %params.process_id,
            host_id = %params.host_id,
            fleet_id = %params.fleet_id,
            sdk_version = SDK_VERSION,
            "Initializing"
        );
        self.inner.connection.connect(&params).await
    }

    /// Report the process ready to host game sessions.
    ///
    /// Registers the callbacks, activates the process and (re)starts the
    /// health-check loop.
    pub async fn process_ready(&self, parameters: ProcessParameters) -> FleetResult<()> {
        self.inner.ready.store(true, Ordering::Release);

        let message = OutboundMessage::activate_server_process(
            SDK_VERSION,
            SDK_LANGUAGE,
            parameters.port,
            parameters.log_parameters.log_paths.clone(),
        );
        let health_check = Arc::clone(&parameters.on_health_check);
        *self.inner.process_parameters.write() = Some(parameters);

        let result = self.inner.send_ack(message).await;
        self.start_health_check(health_check);

        match &result {
            Ok(()) => tracing::info!("Process ready"),
            Err(e) => tracing::error!(error = %e, "Failed to activate process"),
        }
        result
    }

    /// Tell the service this process is ending
    pub async fn process_ending(&self) -> FleetResult<()> {
        self.inner.ready.store(false, Ordering::Release);
        self.stop_health_check();

        tracing::info!("Process ending");
        self.inner
            .send_ack(OutboundMessage::terminate_server_process())
            .await
    }

    /// Stop reporting and close the connection
    pub async fn shutdown(&self) -> FleetResult<()> {
        self.inner.ready.store(false, Ordering::Release);
        self.stop_health_check();

        // Let an in-flight heartbeat see the flag before the socket goes away.
        tokio::time::sleep(self.inner.config.shutdown_grace).await;

        tracing::info!("Shutting down");
        self.inner.connection.disconnect().await
    }

    fn start_health_check(&self, callback: HealthCheckCallback) {
        let config = &self.inner.config;
        let monitor = HealthMonitor {
            ready: Arc::clone(&self.inner.ready),
            correlator: Arc::clone(&self.inner.correlator),
            callback,
            interval: config.health_check_interval,
            max_jitter: config.health_check_max_jitter,
            timeout: config.health_check_timeout(),
        };

        let previous = self.inner.health.lock().replace(monitor.spawn());
        if let Some(previous) = previous {
            previous.stop();
        }
    }

    fn stop_health_check(&self) {
        let handle = self.inner.health.lock().take();
        if let Some(handle) = handle {
            handle.stop();
        }
    }

    // === Game session ===

    pub async fn activate_game_session(&self) -> FleetResult<()> {
        let game_session_id = self.game_session_id()?;
        self.inner
            .send_ack(OutboundMessage::activate_game_session(&game_session_id))
            .await
    }

    pub async fn update_player_session_creation_policy(
        &self,
        policy: PlayerSessionCreationPolicy,
    ) -> FleetResult<()> {
        let game_session_id = self.game_session_id()?;
        self.inner
            .send_ack(OutboundMessage::update_player_session_creation_policy(
                &game_session_id,
                policy,
            ))
            .await
    }

    /// Id of the active game session
    pub fn game_session_id(&self) -> FleetResult<String> {
        self.inner
            .game_session_id
            .read()
            .clone()
            .ok_or(FleetError::GameSessionIdNotSet)
    }

    /// Deadline announced by the service's terminate request
    pub fn termination_time(&self) -> FleetResult<DateTime<Utc>> {
        (*self.inner.termination_time.read()).ok_or(FleetError::TerminationTimeNotSet)
    }

    // === Player sessions ===

    pub async fn accept_player_session(&self, player_session_id: &str) -> FleetResult<()> {
        let game_session_id = self.game_session_id()?;
        self.inner
            .send_ack(OutboundMessage::accept_player_session(
                &game_session_id,
                player_session_id,
            ))
            .await
    }

    pub async fn remove_player_session(&self, player_session_id: &str) -> FleetResult<()> {
        let game_session_id = self.game_session_id()?;
        self.inner
            .send_ack(OutboundMessage::remove_player_session(
                &game_session_id,
                player_session_id,
            ))
            .await
    }

    /// Describe player sessions by game session, player session or player
    pub async fn describe_player_sessions(
        &self,
        mut request: DescribePlayerSessionsRequest,
    ) -> FleetResult<DescribePlayerSessionsResult> {
        if !request.has_target() {
            return Err(FleetError::bad_request(
                "one of GameSessionId, PlayerSessionId or PlayerId is required",
            ));
        }
        request.limit.get_or_insert(DEFAULT_DESCRIBE_LIMIT);

        match self
            .inner
            .correlator
            .send_request(OutboundMessage::describe_player_sessions(request))
            .await?
        {
            ResponsePayload::DescribePlayerSessions(result) => Ok(result),
            other => Err(unexpected_payload("DescribePlayerSessions", &other)),
        }
    }

    // === Matchmaking ===

    pub async fn start_match_backfill(
        &self,
        request: StartMatchBackfillRequest,
    ) -> FleetResult<StartMatchBackfillResult> {
        if request.game_session_arn.is_empty() {
            return Err(FleetError::bad_request("GameSessionArn is required"));
        }
        if request.matchmaking_configuration_arn.is_empty() {
            return Err(FleetError::bad_request("MatchmakingConfigurationArn is required"));
        }
        if request.players.is_empty() {
            return Err(FleetError::bad_request("at least one player is required"));
        }

        match self
            .inner
            .correlator
            .send_request(OutboundMessage::start_match_backfill(request))
            .await?
        {
            ResponsePayload::StartMatchBackfill(result) => Ok(result),
            other => Err(unexpected_payload("StartMatchBackfill", &other)),
        }
    }

    pub async fn stop_match_backfill(&self, request: StopMatchBackfillRequest) -> FleetResult<()> {
        if request.game_session_arn.is_empty() {
            return Err(FleetError::bad_request("GameSessionArn is required"));
        }
        if request.matchmaking_configuration_arn.is_empty() {
            return Err(FleetError::bad_request("MatchmakingConfigurationArn is required"));
        }
        if request.ticket_id.is_empty() {
            return Err(FleetError::bad_request("TicketId is required"));
        }

        self.inner
            .send_ack(OutboundMessage::stop_match_backfill(request))
            .await
    }

    // === Compute ===

    pub async fn get_compute_certificate(&self) -> FleetResult<GetComputeCertificateResult> {
        match self
            .inner
            .correlator
            .send_request(OutboundMessage::get_compute_certificate())
            .await?
        {
            ResponsePayload::ComputeCertificate(result) => Ok(result),
            other => Err(unexpected_payload("GetComputeCertificate", &other)),
        }
    }

    /// Short-lived credentials for `request.role_arn`, served from cache
    /// while they outlive the renewal window
    pub async fn get_fleet_role_credentials(
        &self,
        mut request: GetFleetRoleCredentialsRequest,
    ) -> FleetResult<GetFleetRoleCredentialsResult> {
        let credentials = &self.inner.credentials;
        if credentials.is_not_managed() {
            return Err(FleetError::bad_request(
                "role credentials are only available on managed infrastructure",
            ));
        }
        if request.role_arn.is_empty() {
            return Err(FleetError::bad_request("RoleArn is required"));
        }

        if let Some(cached) = credentials.get_fresh(&request.role_arn) {
            tracing::debug!(role_arn = %request.role_arn, "Using cached role credentials");
            return Ok(cached);
        }

        let name_len = request
            .role_session_name
            .as_deref()
            .map_or(0, |name| name.chars().count());
        if name_len == 0 {
            let (fleet_id, host_id) = self.inner.fleet_and_host();
            request.role_session_name = Some(default_session_name(&fleet_id, &host_id));
        } else if name_len > MAX_ROLE_SESSION_NAME_LEN {
            return Err(FleetError::bad_request(format!(
                "RoleSessionName is longer than {MAX_ROLE_SESSION_NAME_LEN} characters"
            )));
        }

        // Concurrent callers for one role wait here and reuse the first fetch.
        let fetch_lock = credentials.fetch_lock(&request.role_arn);
        let _fetching = fetch_lock.lock().await;
        if credentials.is_not_managed() {
            return Err(FleetError::bad_request(
                "role credentials are only available on managed infrastructure",
            ));
        }
        if let Some(cached) = credentials.get_fresh(&request.role_arn) {
            return Ok(cached);
        }

        let role_arn = request.role_arn.clone();
        let result = match self
            .inner
            .correlator
            .send_request(OutboundMessage::get_fleet_role_credentials(request))
            .await?
        {
            ResponsePayload::FleetRoleCredentials(result) => result,
            other => return Err(unexpected_payload("GetFleetRoleCredentials", &other)),
        };

        if result.access_key_id.is_empty() {
            credentials.mark_not_managed();
            tracing::warn!(role_arn = %role_arn, "Not running on managed infrastructure");
            return Err(FleetError::bad_request(
                "role credentials are only available on managed infrastructure",
            ));
        }

        credentials.insert(&role_arn, result.clone());
        Ok(result)
    }

    // === Accessors ===

    #[must_use]
    pub fn is_process_ready(&self) -> bool {
        self.inner.ready.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn connection_state(&self) -> ConnectionState {
        self.inner.connection.state()
    }

    #[must_use]
    pub const fn sdk_version(&self) -> &'static str {
        SDK_VERSION
    }
}

impl std::fmt::Debug for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerState")
            .field("ready", &self.is_process_ready())
            .field("connection", &self.connection_state())
            .field("game_session_id", &*self.inner.game_session_id.read())
            .finish_non_exhaustive()
    }
}

fn unexpected_payload(expected: &str, payload: &ResponsePayload) -> FleetError {
    FleetError::internal(format!(
        "expected {expected} response, got {}",
        payload.kind()
    ))
}

impl ServerStateInner {
    /// Send a request whose response carries nothing of interest
    async fn send_ack(&self, message: OutboundMessage) -> FleetResult<()> {
        self.correlator.send_request(message).await.map(|_| ())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn fleet_and_host(&self) -> (String, String) {
        self.identity
            .read()
            .as_ref()
            .map(|identity| (identity.fleet_id.clone(), identity.host_id.clone()))
            .unwrap_or_default()
    }

    fn registered<T>(&self, pick: impl FnOnce(&ProcessParameters) -> T) -> Option<T> {
        self.process_parameters.read().as_ref().map(pick)
    }
}

impl MessageHandler for ServerStateInner {
    fn on_response(&self, request_id: &str, outcome: FleetResult<ResponsePayload>) {
        self.correlator.handle_response(request_id, outcome);
    }

    fn on_start_game_session(&self, mut game_session: GameSession) {
        if !self.is_ready() {
            tracing::warn!(
                game_session_id = %game_session.game_session_id,
                "Process not ready, ignoring game session start"
            );
            return;
        }

        let (fleet_id, _) = self.fleet_and_host();
        game_session.fleet_id = fleet_id;
        *self.game_session_id.write() = Some(game_session.game_session_id.clone());

        tracing::info!(
            game_session_id = %game_session.game_session_id,
            "Game session started"
        );
        if let Some(callback) = self.registered(|p| Arc::clone(&p.on_start_game_session)) {
            self.dispatcher
                .dispatch("on_start_game_session", callback(game_session));
        }
    }

    fn on_update_game_session(&self, update: UpdateGameSession) {
        if !self.is_ready() {
            tracing::warn!(
                game_session_id = %update.game_session.game_session_id,
                "Process not ready, ignoring game session update"
            );
            return;
        }

        tracing::info!(
            game_session_id = %update.game_session.game_session_id,
            reason = %update.update_reason,
            "Game session updated"
        );
        if let Some(callback) = self.registered(|p| Arc::clone(&p.on_update_game_session)) {
            self.dispatcher
                .dispatch("on_update_game_session", callback(update));
        }
    }

    fn on_terminate_process(&self, termination_time: Option<DateTime<Utc>>) {
        *self.termination_time.write() = termination_time;

        tracing::info!(termination_time = ?termination_time, "Process termination requested");
        if let Some(callback) = self.registered(|p| Arc::clone(&p.on_process_terminate)) {
            self.dispatcher.dispatch("on_process_terminate", callback());
        }
    }

    fn on_refresh_connection(&self, endpoint: String, auth_token: String) {
        let Some(params) = self
            .identity
            .read()
            .as_ref()
            .map(|identity| identity.with_endpoint(endpoint, auth_token))
        else {
            tracing::warn!("Connection refresh before initialization, ignoring");
            return;
        };

        let connection = Arc::clone(&self.connection);
        tokio::spawn(async move {
            match connection.connect(&params).await {
                Ok(()) => tracing::info!(endpoint = %params.websocket_url, "Connection refreshed"),
                Err(e) => tracing::warn!(
                    endpoint = %params.websocket_url,
                    error = %e,
                    "Connection refresh failed, keeping existing connection"
                ),
            }
        });
    }
}
