//! Cloud Asset Inventory exports
//!
//! One export request per source project, each a long-running operation
//! polled to completion. A project whose export fails on the remote side is
//! logged and skipped; the remaining projects still run.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GcpConfig;
use crate::error::{Result, SyncError};

/// A completed export staged in the bucket, owned by the current run until
/// the orchestrator deletes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedExport {
    /// Source project the snapshot came from
    pub project: String,
    /// Staging locator, `gs://{bucket}/{object}`
    pub uri: String,
}

/// Client for the Cloud Asset Inventory export API
pub struct AssetInventoryClient {
    client: Client,
    config: GcpConfig,
    token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportAssetsRequest<'a> {
    asset_types: &'a [String],
    content_type: &'a str,
    output_config: OutputConfig<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct OutputConfig<'a> {
    gcs_destination: GcsDestination<'a>,
}

#[derive(Debug, Serialize)]
struct GcsDestination<'a> {
    uri: &'a str,
}

/// Long-running operation handle returned by the export API
#[derive(Debug, Deserialize)]
struct Operation {
    name: String,
    #[serde(default)]
    done: bool,
    error: Option<OperationError>,
}

#[derive(Debug, Deserialize)]
struct OperationError {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

impl AssetInventoryClient {
    /// Create a new client with a resolved access token
    pub fn new(client: Client, config: GcpConfig, token: String) -> Self {
        Self {
            client,
            config,
            token,
        }
    }

    /// Export the asset inventory of every project into the staging bucket.
    ///
    /// Completed exports are appended to `staged` as they finish, so the
    /// caller can delete everything that reached the bucket even when a
    /// later project fails in an unexpected way. Remote failures (HTTP
    /// errors, non-success responses, operations completing with an error)
    /// skip the project and leave nothing behind for it.
    pub async fn export_projects(
        &self,
        projects: &[String],
        asset_types: &[String],
        bucket: &str,
        staged: &mut Vec<StagedExport>,
    ) -> Result<()> {
        for project in projects {
            match self.export_project(project, asset_types, bucket).await {
                Ok(export) => {
                    info!("Exported assets from {} to {}", project, export.uri);
                    staged.push(export);
                }
                Err(e) if e.is_remote() => {
                    warn!("Error exporting assets from project {}: {}", project, e);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(())
    }

    /// Export one project's inventory and wait for the operation to finish
    async fn export_project(
        &self,
        project: &str,
        asset_types: &[String],
        bucket: &str,
    ) -> Result<StagedExport> {
        let uri = format!("gs://{}/{}", bucket, export_object_name(project));

        let request = ExportAssetsRequest {
            asset_types,
            content_type: "RESOURCE",
            output_config: OutputConfig {
                gcs_destination: GcsDestination { uri: &uri },
            },
        };

        let url = format!(
            "{}/v1/projects/{}:exportAssets",
            self.config.asset_api_base, project
        );
        debug!("Submitting export for {} to {}", project, uri);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::from_response("asset api", response).await);
        }

        let mut operation: Operation = response.json().await?;

        // The export is a long-running operation; block until the service
        // reports it done.
        while !operation.done {
            tokio::time::sleep(Duration::from_millis(self.config.export_poll_ms)).await;
            operation = self.poll_operation(&operation.name).await?;
        }

        if let Some(error) = operation.error {
            return Err(SyncError::Export(format!(
                "{} (code {})",
                error.message, error.code
            )));
        }

        Ok(StagedExport {
            project: project.to_string(),
            uri,
        })
    }

    async fn poll_operation(&self, name: &str) -> Result<Operation> {
        let url = format!("{}/v1/{}", self.config.asset_api_base, name);

        let response = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SyncError::from_response("asset api", response).await);
        }

        Ok(response.json().await?)
    }
}

/// Build a staging object name unique across concurrent runs.
///
/// `{project}_assets_{unix_ts}_{suffix}.csv`, where the suffix is the first
/// eight characters of a v4 UUID.
fn export_object_name(project: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    let unique_id = Uuid::new_v4().simple().to_string();
    format!("{}_assets_{}_{}.csv", project, timestamp, &unique_id[..8])
}

// ============================================================================
// Tests
// ============================================================================
