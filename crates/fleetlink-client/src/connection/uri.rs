//! Connection URI

use fleetlink_common::ServerParameters;
use url::Url;

use crate::{SDK_LANGUAGE, SDK_VERSION};

/// Append the process identity to the endpoint as query parameters.
///
/// A pathless endpoint gets the root path, and values are percent-encoded.
pub fn build_connection_uri(params: &ServerParameters) -> Result<String, url::ParseError> {
    let mut uri = Url::parse(&params.websocket_url)?;
    uri.query_pairs_mut()
        .append_pair("pID", &params.process_id)
        .append_pair("sdkVersion", SDK_VERSION)
        .append_pair("sdkLanguage", SDK_LANGUAGE)
        .append_pair("Authorization", &params.auth_token)
        .append_pair("ComputeId", &params.host_id)
        .append_pair("FleetId", &params.fleet_id);

    Ok(uri.into())
}
