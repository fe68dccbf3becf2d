//! Request/response correlation

mod request_correlator;

pub use request_correlator::{RequestCorrelator, DEFAULT_REQUEST_TIMEOUT};
