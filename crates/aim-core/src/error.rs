//! Error types for the sync pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Error type covering every stage of the sync pipeline.
///
/// Stages that tolerate failures (per-project export, per-file cleaning,
/// per-row writes) match on the variants they consider expected and let
/// everything else propagate to the run-level error path.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{service} responded with {status}: {message}")]
    Api {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("export operation failed: {0}")]
    Export(String),

    #[error("invalid staging locator: {0}")]
    Locator(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("no input files survived cleaning")]
    NoUsableInput,
}

impl SyncError {
    /// Whether this is a failed interaction with a remote service, as
    /// opposed to a local fault or a precondition violation. Remote
    /// failures are the recoverable class at the per-project and per-row
    /// isolation points.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            SyncError::Http(_) | SyncError::Api { .. } | SyncError::Export(_)
        )
    }

    /// Build an [`SyncError::Api`] from a non-success response, consuming
    /// the body as the message.
    pub async fn from_response(service: &'static str, response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        SyncError::Api {
            service,
            status,
            message,
        }
    }
}
