//! Clear-before-write
//!
//! Archives every existing destination record ahead of the rewrite, walking
//! the database with cursor-paginated queries. A failed page query ends the
//! clear early with however many records were archived so far; the caller
//! proceeds against a partially cleared database rather than aborting the
//! run. Archive mutations are paced through the caller's rate gate.

use tracing::{info, warn};

use crate::error::Result;
use crate::notion::client::NotionClient;
use crate::pacing::RateGate;

/// Archive all records currently in the destination database.
///
/// Returns the number of records archived. Individual archive failures are
/// logged and do not count toward the total; a page-query failure returns
/// the partial count instead of an error. Only faults classified as remote
/// are tolerated; anything else propagates.
pub async fn clear_database(client: &NotionClient, gate: &RateGate) -> Result<usize> {
    warn!("Clearing all existing destination records");

    let mut archived = 0;
    let mut cursor: Option<String> = None;

    loop {
        let page = match client.query_page(cursor.as_deref()).await {
            Ok(page) => page,
            Err(e) if e.is_remote() => {
                warn!("Error querying destination database: {}", e);
                return Ok(archived);
            }
            Err(e) => return Err(e),
        };

        for record in &page.results {
            gate.admit().await;

            match client.archive_page(&record.id).await {
                Ok(()) => archived += 1,
                Err(e) if e.is_remote() => {
                    warn!("Failed to archive record {}: {}", record.id, e);
                }
                Err(e) => return Err(e),
            }
        }

        if !page.has_more {
            break;
        }
        match page.next_cursor {
            Some(next) => cursor = Some(next),
            // More pages announced but no cursor to reach them; treat as
            // the last page rather than re-querying from the start
            None => break,
        }
    }

    info!("Archived {} records from the destination database", archived);

    Ok(archived)
}
