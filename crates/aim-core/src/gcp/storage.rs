//! Staging object store
//!
//! Cloud Storage JSON API client scoped to the staging bucket. Downloads
//! carry no per-file isolation: the locator-to-local-name mapping depends on
//! an exact prefix match with the bucket address, so a malformed locator is
//! a precondition violation and every transport error aborts the run.

use std::path::{Path, PathBuf};

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::Client;
use tracing::{debug, info};

use crate::config::GcpConfig;
use crate::error::{Result, SyncError};

/// Client for the staging bucket
pub struct StorageClient {
    client: Client,
    config: GcpConfig,
    bucket: String,
    token: String,
}

impl StorageClient {
    /// Create a new client scoped to one bucket
    pub fn new(client: Client, config: GcpConfig, bucket: String, token: String) -> Self {
        Self {
            client,
            config,
            bucket,
            token,
        }
    }

    /// Extract the object name from a `gs://{bucket}/{object}` locator.
    ///
    /// The locator must name this client's bucket exactly; anything else is
    /// an unrecoverable precondition violation, not a retryable fault.
    pub fn object_name(&self, uri: &str) -> Result<String> {
        let prefix = format!("gs://{}/", self.bucket);

        match uri.strip_prefix(&prefix) {
            Some(object) if !object.is_empty() => Ok(object.to_string()),
            _ => Err(SyncError::Locator(format!(
                "{} does not name an object in bucket {}",
                uri, self.bucket
            ))),
        }
    }

    /// Download a staged object into `dir`, preserving its base name.
    pub async fn download_to(&self, uri: &str, dir: &Path) -> Result<PathBuf> {
        let object = self.object_name(uri)?;
        debug!("Downloading {}", uri);

        let url = format!("{}?alt=media", self.object_url(&object));
        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::from_response("cloud storage", response).await);
        }

        let bytes = response.bytes().await?;

        let base_name = object.rsplit('/').next().unwrap_or(&object);
        let local_path = dir.join(base_name);
        tokio::fs::write(&local_path, &bytes).await?;

        info!("Downloaded {} to {}", uri, local_path.display());

        Ok(local_path)
    }

    /// Delete a staged object
    pub async fn delete(&self, uri: &str) -> Result<()> {
        let object = self.object_name(uri)?;
        debug!("Deleting {}", uri);

        let response = self
            .client
            .delete(&self.object_url(&object))
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::from_response("cloud storage", response).await);
        }

        Ok(())
    }

    fn object_url(&self, object: &str) -> String {
        format!(
            "{}/storage/v1/b/{}/o/{}",
            self.config.storage_api_base,
            self.bucket,
            utf8_percent_encode(object, NON_ALPHANUMERIC)
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
