// Google Cloud clients
//
// Everything the pipeline needs from Google: an OAuth2 access token, the
// Cloud Asset Inventory export API, and the Cloud Storage JSON API for the
// staging bucket. All three speak plain HTTPS through a shared
// `reqwest::Client`; the token is resolved once per run and carried
// immutably by the two API clients.

pub mod asset;
pub mod auth;
pub mod storage;

// Re-export main types
pub use asset::{AssetInventoryClient, StagedExport};
pub use storage::StorageClient;
