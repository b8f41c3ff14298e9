//! Mapping of [`Error`] onto HTTP responses.
//!
//! The body is always `{"error": {"code", "message"}}`. Internal errors are logged with their
//! details and answered with a generic message.

use crate::errors::{Error, ErrorCode};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

impl ErrorCode {
    /// HTTP status for this reason code.
    #[must_use]
    pub const fn http_status(self) -> StatusCode {
        match self {
            Self::InvalidArgument => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::FailedPrecondition => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let code = self.code();
        let message = if code == ErrorCode::Internal {
            tracing::error!(error = %self, "Internal error while handling request");
            "Internal error".to_string()
        } else {
            self.to_string()
        };

        let body = json!({
            "error": {
                "code": code.as_str(),
                "message": message,
            }
        });
        (code.http_status(), Json(body)).into_response()
    }
}
