//! Error types

mod fleet_error;

pub use fleet_error::{FleetError, FleetResult};
