//! Pipeline orchestration
//!
//! Sequences the full sync: export every project's inventory to the staging
//! bucket, download the staged files into a scoped workspace, clean and
//! merge them, then rewrite the destination database. Strictly sequential;
//! at most one remote request is in flight at any point, and no remote call
//! carries a timeout or retry.
//!
//! The run owns its staged objects and local workspace exclusively. Both
//! are cleaned up on every exit path; staged-object deletion failures are
//! logged, never escalated.

use std::path::Path;
use std::time::Instant;

use reqwest::Client;
use tracing::{error, info, warn};

use crate::config::SyncConfig;
use crate::error::Result;
use crate::gcp::{auth, AssetInventoryClient, StagedExport, StorageClient};
use crate::notion::{writer, NotionClient, WriteStats};
use crate::transform;

/// Name of the merged dataset inside the workspace
pub const MERGED_FILE_NAME: &str = "merged_assets.csv";

/// One-shot sync pipeline bound to an immutable configuration
pub struct SyncPipeline {
    config: SyncConfig,
}

impl SyncPipeline {
    /// Create a new pipeline
    pub fn new(config: SyncConfig) -> Self {
        Self { config }
    }

    /// The configuration this pipeline runs with
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Run one full sync.
    ///
    /// The outcome is binary: diagnostics for skipped projects, files, and
    /// rows exist only as log output. Any fault that escapes a stage is
    /// logged here and re-raised.
    pub async fn run(&self) -> Result<()> {
        let start = Instant::now();
        info!(
            "Starting asset inventory sync for {} projects",
            self.config.projects.len()
        );

        match self.run_scoped().await {
            Ok(stats) => {
                info!(
                    "Sync completed in {:.2}s: {} records archived, {} rows attempted",
                    start.elapsed().as_secs_f64(),
                    stats.archived,
                    stats.rows_attempted
                );
                Ok(())
            }
            Err(e) => {
                error!("Error in sync process: {}", e);
                Err(e)
            }
        }
    }

    /// Resolve credentials, create the scoped workspace, run the stages,
    /// and clean up staged objects and the workspace whatever the outcome.
    async fn run_scoped(&self) -> Result<WriteStats> {
        let http = Client::new();
        let token = auth::resolve_access_token(&self.config.gcp, &http).await?;

        let asset = AssetInventoryClient::new(http.clone(), self.config.gcp.clone(), token.clone());
        let storage = StorageClient::new(
            http.clone(),
            self.config.gcp.clone(),
            self.config.staging_bucket.clone(),
            token,
        );
        let notion = NotionClient::new(http, self.config.notion.clone());

        let workspace = tempfile::tempdir()?;
        let mut staged: Vec<StagedExport> = Vec::new();

        let outcome = self
            .run_stages(&asset, &storage, &notion, workspace.path(), &mut staged)
            .await;

        // Every staged object belongs to this run; delete them all, used or
        // not, before reporting the outcome
        for export in &staged {
            match storage.delete(&export.uri).await {
                Ok(()) => info!("Deleted staged file {}", export.uri),
                Err(e) => warn!("Failed to delete staged file {}: {}", export.uri, e),
            }
        }

        if let Err(e) = workspace.close() {
            warn!("Failed to remove local workspace: {}", e);
        }

        outcome
    }

    async fn run_stages(
        &self,
        asset: &AssetInventoryClient,
        storage: &StorageClient,
        notion: &NotionClient,
        workspace: &Path,
        staged: &mut Vec<StagedExport>,
    ) -> Result<WriteStats> {
        info!(
            "Step 1/4: Exporting asset inventories to gs://{}",
            self.config.staging_bucket
        );
        asset
            .export_projects(
                &self.config.projects,
                &self.config.asset_types,
                &self.config.staging_bucket,
                staged,
            )
            .await?;
        info!(
            "Exported {} of {} projects",
            staged.len(),
            self.config.projects.len()
        );

        info!("Step 2/4: Downloading staged files");
        let mut local_files = Vec::with_capacity(staged.len());
        for export in staged.iter() {
            local_files.push(storage.download_to(&export.uri, workspace).await?);
        }

        info!("Step 3/4: Cleaning and merging {} files", local_files.len());
        let merged_path = workspace.join(MERGED_FILE_NAME);
        transform::clean_and_merge(&local_files, &merged_path)?;

        info!("Step 4/4: Updating destination database");
        writer::update_database(notion, &self.config.limits, &merged_path).await
    }
}

// ============================================================================
// Tests
// ============================================================================
