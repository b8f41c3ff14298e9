//! Profile lifecycle API handlers
//!
//! POST /create-user-profile - create the caller's own profile after sign-up
//! POST /delete-user         - remove a user with all their records (admin or self)

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::core::access::require_role;
use crate::core::users::{self, NewUser};
use crate::core::{Caller, Role};
use crate::errors::{Error, Result};

/// Body of `POST /create-user-profile`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    /// Login email address
    #[serde(default)]
    pub email: String,
    /// Full display name
    pub display_name: Option<String>,
    /// Department to assign
    pub department_id: Option<i64>,
}

/// Response of `POST /create-user-profile`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileResponse {
    /// Always `true`
    pub success: bool,
    /// The new profile's id, equal to the caller's
    pub user_id: String,
    /// Role derived from the email address
    pub role: String,
}

/// Body of `POST /delete-user`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserRequest {
    /// User to remove
    #[serde(default)]
    pub user_id: String,
}

/// Response of `POST /delete-user`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteUserResponse {
    /// Always `true`
    pub success: bool,
    /// Removed user
    pub user_id: String,
}

/// Creates the caller's profile with a zero saldo.
pub async fn create_user_profile(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateProfileRequest>,
) -> Result<Json<CreateProfileResponse>> {
    let created = users::create_user_profile(
        state.store.connection(),
        NewUser {
            id: caller.user_id,
            email: req.email,
            display_name: req.display_name,
            department_id: req.department_id,
        },
    )
    .await?;
    Ok(Json(CreateProfileResponse {
        success: true,
        user_id: created.id,
        role: created.role,
    }))
}

/// Deletes a user and their schedules and time records. Admin, or the user themself.
pub async fn delete_user(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<DeleteUserRequest>,
) -> Result<Json<DeleteUserResponse>> {
    if req.user_id.trim().is_empty() {
        return Err(Error::invalid_argument("userId is required"));
    }
    if req.user_id != caller.user_id {
        require_role(state.store.as_ref(), &caller, &[Role::Admin]).await?;
    }

    users::delete_user(state.store.connection(), &req.user_id).await?;
    Ok(Json(DeleteUserResponse {
        success: true,
        user_id: req.user_id,
    }))
}
