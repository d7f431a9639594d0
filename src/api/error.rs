//! Mapping from crate errors to HTTP responses.
//!
//! Every error body has the shape `{"kind": "...", "message": "..."}`. Internal
//! failures are logged here and reported with a generic message.

use crate::errors::Error;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::{error, info};

/// JSON error body returned to clients.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error kind
    pub kind: &'static str,
    /// Human-readable description
    pub message: String,
}

impl Error {
    /// Returns the HTTP status code for this error.
    ///
    /// - Validation: 400 Bad Request
    /// - Unauthorized: 401
    /// - Forbidden: 403
    /// - Account/Category not found: 404
    /// - Conflict: 409
    /// - Insufficient funds: 422 Unprocessable Entity
    /// - Everything else: 500
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::AccountNotFound { .. } | Self::CategoryNotFound { .. } => StatusCode::NOT_FOUND,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::InsufficientFunds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::PostingFailed
            | Self::Integrity { .. }
            | Self::Config { .. }
            | Self::Database(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn client_message(&self) -> String {
        match self {
            Self::Integrity { .. } | Self::Config { .. } | Self::Database(_) | Self::Io(_) => {
                "Internal server error".to_string()
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, kind = self.kind(), "Request failed");
        } else {
            info!(error = %self, kind = self.kind(), "Request rejected");
        }

        let body = ErrorBody {
            kind: self.kind(),
            message: self.client_message(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.body_text())
    }
}
