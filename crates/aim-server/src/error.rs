//! Server-specific error types

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("sync error: {0}")]
    Sync(#[from] aim_core::SyncError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let AppError::Sync(ref e) = self;
        tracing::error!("Sync request failed: {}", e);

        let status = StatusCode::INTERNAL_SERVER_ERROR;
        let body = Json(json!({
            "error": {
                "message": e.to_string(),
                "status": status.as_u16(),
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aim_core::SyncError;

    #[test]
    fn test_sync_errors_map_to_server_error() {
        let error = AppError::from(SyncError::NoUsableInput);
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_remote_failures_also_map_to_server_error() {
        let error = AppError::from(SyncError::Api {
            service: "notion",
            status: 502,
            message: "bad gateway".to_string(),
        });
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
