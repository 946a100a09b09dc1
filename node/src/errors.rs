// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use ledger_effects::{EffectsError, StorageError};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error(transparent)]
    Effects(#[from] EffectsError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Seed file error: {0}")]
    Seed(#[from] serde_json::Error),
}

impl NodeError {
    fn status(&self) -> StatusCode {
        match self {
            NodeError::Effects(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            NodeError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NodeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (kind, title, detail) = if status == StatusCode::BAD_REQUEST {
            ("bad_request", "Bad Request", self.to_string())
        } else {
            // Causes stay in the log, not in the response body.
            tracing::error!(error = ?self, "request failed");
            (
                "server_error",
                "Internal Server Error",
                "An error occurred while processing this request.".to_string(),
            )
        };

        let body = Json(json!({
            "type": kind,
            "title": title,
            "status": status.as_u16(),
            "detail": detail,
        }));

        (status, body).into_response()
    }
}
