//! AIM Core Library
//!
//! Full-replace synchronization of a GCP asset inventory into a Notion
//! database.
//!
//! # Overview
//!
//! One run walks the whole pipeline:
//!
//! - **Export**: request an asset-inventory snapshot per source project and
//!   stage the resulting CSVs in a Cloud Storage bucket
//! - **Download**: fetch the staged files into a scoped local workspace
//! - **Transform**: clean, enrich, and merge the per-project tables into a
//!   single dataset
//! - **Write**: archive every existing destination record, then recreate one
//!   record per merged row, mapped through the destination's typed schema
//!
//! Every run fully replaces the destination contents; there is no
//! incremental diff path. Failure policy is per-stage: some faults skip a
//! single project, file, or row, others abort the run (see the individual
//! modules). Diagnostics exist only as log output; callers get a binary
//! success/failure outcome.
//!
//! # Example
//!
//! ```no_run
//! use aim_core::config::SyncConfig;
//! use aim_core::pipeline::SyncPipeline;
//!
//! #[tokio::main]
//! async fn main() -> aim_core::Result<()> {
//!     let config = SyncConfig::load()?;
//!     let pipeline = SyncPipeline::new(config);
//!     pipeline.run().await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod gcp;
pub mod logging;
pub mod notion;
pub mod pacing;
pub mod pipeline;
pub mod transform;

// Re-export commonly used types
pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use pipeline::SyncPipeline;
