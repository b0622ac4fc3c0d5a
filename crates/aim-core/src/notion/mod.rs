// Destination database (Notion)
//
// Everything the pipeline does against the destination: fetch the field
// schema, archive the current contents, map merged rows into typed property
// payloads, and create the replacement records. The destination owns
// records once created; this pipeline never tracks them afterwards.

pub mod client;
pub mod mapper;
pub mod reset;
pub mod schema;
pub mod writer;

// Re-export main types
pub use client::{Database, NotionClient, PageRef, QueryPage};
pub use mapper::map_row;
pub use reset::clear_database;
pub use schema::{DatabaseSchema, PropertyKind, SchemaField};
pub use writer::{update_database, WriteStats, WRITE_BATCH_SIZE};
