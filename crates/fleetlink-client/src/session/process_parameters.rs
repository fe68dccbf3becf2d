//! Process parameters
//!
//! Callbacks and settings a process registers when it reports ready.

use fleetlink_core::{GameSession, UpdateGameSession};
use futures::future::{BoxFuture, FutureExt};
use std::fmt;
use std::future::Future;
use std::sync::Arc;

pub type StartGameSessionCallback =
    Arc<dyn Fn(GameSession) -> BoxFuture<'static, ()> + Send + Sync>;
pub type UpdateGameSessionCallback =
    Arc<dyn Fn(UpdateGameSession) -> BoxFuture<'static, ()> + Send + Sync>;
pub type ProcessTerminateCallback = Arc<dyn Fn() -> BoxFuture<'static, ()> + Send + Sync>;
pub type HealthCheckCallback = Arc<dyn Fn() -> BoxFuture<'static, bool> + Send + Sync>;

/// Files the service should collect when the process ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogParameters {
    pub log_paths: Vec<String>,
}

impl LogParameters {
    pub fn new<I, S>(log_paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            log_paths: log_paths.into_iter().map(Into::into).collect(),
        }
    }
}

/// Callbacks and settings passed to `process_ready`
///
/// Unset callbacks do nothing; the default health check reports healthy.
#[derive(Clone)]
pub struct ProcessParameters {
    pub(crate) on_start_game_session: StartGameSessionCallback,
    pub(crate) on_update_game_session: UpdateGameSessionCallback,
    pub(crate) on_process_terminate: ProcessTerminateCallback,
    pub(crate) on_health_check: HealthCheckCallback,
    pub port: i32,
    pub log_parameters: LogParameters,
}

impl ProcessParameters {
    #[must_use]
    pub fn new() -> Self {
        Self {
            on_start_game_session: Arc::new(|_: GameSession| async {}.boxed()),
            on_update_game_session: Arc::new(|_: UpdateGameSession| async {}.boxed()),
            on_process_terminate: Arc::new(|| async {}.boxed()),
            on_health_check: Arc::new(|| async { true }.boxed()),
            port: 0,
            log_parameters: LogParameters::default(),
        }
    }

    /// Called when the service places a game session on this process
    #[must_use]
    pub fn on_start_game_session<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(GameSession) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_start_game_session = Arc::new(move |game_session: GameSession| callback(game_session).boxed());
        self
    }

    #[must_use]
    pub fn on_update_game_session<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn(UpdateGameSession) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_update_game_session = Arc::new(move |update: UpdateGameSession| callback(update).boxed());
        self
    }

    /// Called when the service asks the process to shut down
    #[must_use]
    pub fn on_process_terminate<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.on_process_terminate = Arc::new(move || callback().boxed());
        self
    }

    /// Polled by the health-check loop; `false`, a panic or a timeout all
    /// report the process unhealthy
    #[must_use]
    pub fn on_health_check<F, Fut>(mut self, callback: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = bool> + Send + 'static,
    {
        self.on_health_check = Arc::new(move || callback().boxed());
        self
    }

    #[must_use]
    pub fn port(mut self, port: i32) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn log_parameters(mut self, log_parameters: LogParameters) -> Self {
        self.log_parameters = log_parameters;
        self
    }
}

impl Default for ProcessParameters {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ProcessParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessParameters")
            .field("port", &self.port)
            .field("log_parameters", &self.log_parameters)
            .finish_non_exhaustive()
    }
}
