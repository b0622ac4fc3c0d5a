//! Destination rewrite
//!
//! The write phase of a run: clear the database, fetch and resolve its
//! schema, then recreate one record per merged row. Rows go through in
//! fixed-size batches purely for progress logging and pacing; batching has
//! no other semantic effect. A row whose create fails is logged and
//! skipped, never retried.

use std::path::Path;

use tracing::{info, warn};

use crate::config::RateLimits;
use crate::error::Result;
use crate::notion::client::NotionClient;
use crate::notion::mapper::map_row;
use crate::notion::reset::clear_database;
use crate::notion::schema::DatabaseSchema;
use crate::pacing::RateGate;
use crate::transform::AssetTable;

/// Rows per progress batch
pub const WRITE_BATCH_SIZE: usize = 10;

/// Outcome of the write phase, for the orchestrator's final log line.
///
/// Per-row success and failure counts are deliberately not reported;
/// diagnostics for skipped rows exist only in the logs.
#[derive(Debug, Clone)]
pub struct WriteStats {
    /// Records archived during the clear phase
    pub archived: usize,
    /// Merged rows attempted, whether or not the create succeeded
    pub rows_attempted: usize,
}

/// Replace the destination database contents with the merged dataset.
///
/// Schema fetch failures abort the run; there is no fallback schema. The
/// merged CSV is the one the transform stage wrote, re-read here so the
/// write phase sees exactly what was persisted.
pub async fn update_database(
    client: &NotionClient,
    limits: &RateLimits,
    merged_csv: &Path,
) -> Result<WriteStats> {
    let archive_gate = RateGate::new(limits.archive_rps);
    let archived = clear_database(client, &archive_gate).await?;

    let database = client.database().await?;
    let schema = DatabaseSchema::resolve(&database.properties);
    info!("Retrieved database schema with {} properties", schema.len());

    let table = AssetTable::read_csv(merged_csv)?;
    info!(
        "Loaded merged dataset with {} rows and {} columns",
        table.rows.len(),
        table.columns.len()
    );

    let batch_gate = RateGate::new(limits.batch_rps);
    let total = table.rows.len();

    for (index, batch) in table.rows.chunks(WRITE_BATCH_SIZE).enumerate() {
        batch_gate.admit().await;
        info!("Processing batch {} ({} records)", index + 1, batch.len());

        for row in batch {
            let properties = map_row(&table.columns, row, &schema);

            match client.create_page(&properties).await {
                Ok(()) => {}
                Err(e) if e.is_remote() => {
                    warn!("Error creating record: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    info!("Processed {} records", total);

    Ok(WriteStats {
        archived,
        rows_attempted: total,
    })
}
