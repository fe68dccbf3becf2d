//! Session orchestration
//!
//! Process readiness, game session events, health reporting and the role
//! credential cache.

mod credentials;
mod dispatcher;
mod health;
mod process_parameters;
mod server_state;

pub use credentials::{MAX_ROLE_SESSION_NAME_LEN, RENEWAL_WINDOW_MINUTES};
pub use process_parameters::{
    HealthCheckCallback, LogParameters, ProcessParameters, ProcessTerminateCallback,
    StartGameSessionCallback, UpdateGameSessionCallback,
};
pub use server_state::{ServerState, DEFAULT_DESCRIBE_LIMIT};
