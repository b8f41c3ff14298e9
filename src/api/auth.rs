//! Caller extractor

use crate::core::Caller;
use crate::errors::Error;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

/// Header carrying the authenticated user id, set by the identity proxy.
pub const USER_ID_HEADER: &str = "x-user-id";

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();
        Self::new(user_id.trim())
    }
}
