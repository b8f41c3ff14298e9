//! Administration API handlers
//!
//! POST /update-user-role - change a user's role (admin or manager)
//! POST /export-data      - export schedules and time records (admin)

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::core::export::{self, ExportRequest, ExportResponse};
use crate::core::{Caller, users};
use crate::errors::Result;

/// Body of `POST /update-user-role`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleRequest {
    /// User whose role changes
    #[serde(default)]
    pub target_user_id: String,
    /// `employee`, `manager` or `admin`
    #[serde(default)]
    pub new_role: String,
}

/// Response of `POST /update-user-role`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRoleResponse {
    /// Always `true`
    pub success: bool,
    /// User whose role changed
    pub target_user_id: String,
    /// Stored role
    pub new_role: String,
}

/// Response of `POST /export-data`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDataResponse {
    /// Always `true`
    pub success: bool,
    /// Row count, export type and rows
    #[serde(flatten)]
    pub export: ExportResponse,
}

/// Changes a user's role. Admin or manager.
pub async fn update_user_role(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<UpdateRoleResponse>> {
    let updated =
        users::update_user_role(&state.store, &caller, &req.target_user_id, &req.new_role).await?;
    Ok(Json(UpdateRoleResponse {
        success: true,
        target_user_id: updated.id,
        new_role: updated.role,
    }))
}

/// Exports schedules and time records. Admin only.
pub async fn export_data(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<ExportRequest>,
) -> Result<Json<ExportDataResponse>> {
    let export = export::export_data(&state.store, &caller, &req).await?;
    Ok(Json(ExportDataResponse {
        success: true,
        export,
    }))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use crate::api::create_router;
    use crate::entities::Profile;
    use crate::errors::Result;
    use crate::test_utils::{
        create_test_profile, create_test_schedule, create_test_time_record, post_json,
        setup_test_app,
    };
    use axum::http::StatusCode;
    use sea_orm::EntityTrait;
    use serde_json::json;

    #[tokio::test]
    async fn test_update_user_role() -> Result<()> {
        let (state, _worker) = setup_test_app().await?;
        let db = state.store.connection();
        create_test_profile(db, "lead", "manager").await?;
        create_test_profile(db, "u1", "employee").await?;

        let (status, body) = post_json(
            create_router(state.clone()),
            "/update-user-role",
            Some("lead"),
            json!({ "targetUserId": "u1", "newRole": "manager" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["targetUserId"], "u1");
        assert_eq!(body["newRole"], "manager");

        let profile = Profile::find_by_id("u1".to_string())
            .one(state.store.connection())
            .await?
            .unwrap();
        assert_eq!(profile.role, "manager");

        let (status, body) = post_json(
            create_router(state),
            "/update-user-role",
            Some("lead"),
            json!({ "targetUserId": "u1", "newRole": "superuser" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], "Invalid argument: Invalid role");
        Ok(())
    }

    #[tokio::test]
    async fn test_export_data() -> Result<()> {
        let (state, _worker) = setup_test_app().await?;
        let db = state.store.connection();
        create_test_profile(db, "boss", "admin").await?;
        create_test_profile(db, "u1", "employee").await?;
        create_test_schedule(db, "u1", 8.0, 16.0).await?;
        create_test_time_record(db, "u1", 8.0, Some(16.0), Some(8.0)).await?;

        let (status, body) = post_json(
            create_router(state.clone()),
            "/export-data",
            Some("boss"),
            json!({ "exportType": "all", "userId": "u1" }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["recordCount"], 2);
        assert_eq!(body["exportType"], "all");
        assert_eq!(body["data"][0]["recordType"], "timeRecord");
        assert_eq!(body["data"][0]["userEmail"], "u1@example.com");
        assert_eq!(body["data"][1]["recordType"], "schedule");

        let (status, body) = post_json(
            create_router(state.clone()),
            "/export-data",
            Some("boss"),
            json!({ "exportType": "invoices" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "invalid-argument");

        let (status, _) = post_json(
            create_router(state),
            "/export-data",
            Some("u1"),
            json!({ "exportType": "all" }),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        Ok(())
    }
}
