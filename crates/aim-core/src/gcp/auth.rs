//! Google access-token resolution
//!
//! Both Google APIs authenticate with the same OAuth2 bearer token. On GCP
//! the token comes from the instance metadata server; a configured override
//! (`AIM_GOOGLE_TOKEN`) skips that call for tests and local runs. One run
//! finishes well inside a token lifetime, so there is no refresh logic.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::GcpConfig;
use crate::error::{Result, SyncError};

/// Token endpoint on the metadata server, relative to its base URL
const METADATA_TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

/// Token response from the metadata server
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Resolve the access token for this run.
///
/// A failure here is fatal: without a token neither the export API nor the
/// staging bucket is reachable.
pub async fn resolve_access_token(config: &GcpConfig, client: &Client) -> Result<String> {
    if let Some(token) = &config.access_token {
        debug!("Using configured access token");
        return Ok(token.clone());
    }

    let url = format!("{}{}", config.metadata_base, METADATA_TOKEN_PATH);
    debug!("Requesting access token from metadata server");

    let response = client
        .get(&url)
        .header("Metadata-Flavor", "Google")
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(SyncError::from_response("metadata server", response).await);
    }

    let token: TokenResponse = response.json().await?;
    Ok(token.access_token)
}

// ============================================================================
// Tests
// ============================================================================
