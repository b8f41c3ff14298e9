//! Saldo API handlers
//!
//! POST /calculate-hours-saldo  - recompute one user's saldo now
//! POST /recalculate-all-saldos - recompute every user (admin)
//! POST /record-changes         - queue a schedule/time record change for recomputation

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::core::bulk::{self, BulkRecalcReport};
use crate::core::{Caller, RecordChanged, recalc};
use crate::errors::Result;

// ── Request / Response types ──

/// Body of `POST /calculate-hours-saldo`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    /// User whose saldo is recomputed
    #[serde(default)]
    pub user_id: String,
}

/// Response of `POST /calculate-hours-saldo`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateResponse {
    /// Always `true`; failures are error responses
    pub success: bool,
    /// Worked minus scheduled hours
    pub saldo: f64,
    /// Sum of scheduled hours
    pub scheduled_hours: f64,
    /// Sum of worked hours
    pub worked_hours: f64,
}

/// Response of `POST /recalculate-all-saldos`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalculateAllResponse {
    /// Always `true`; per-user failures are listed in the report
    pub success: bool,
    /// Per-user outcomes
    #[serde(flatten)]
    pub report: BulkRecalcReport,
}

// ── Handlers ──

/// Recomputes and stores one user's saldo.
pub async fn calculate_hours_saldo(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CalculateRequest>,
) -> Result<Json<CalculateResponse>> {
    let result =
        recalc::calculate_hours_saldo(state.store.as_ref(), &caller, &req.user_id, state.policy)
            .await?;
    Ok(Json(CalculateResponse {
        success: true,
        saldo: result.saldo,
        scheduled_hours: result.scheduled_hours,
        worked_hours: result.worked_hours,
    }))
}

/// Recomputes every user's saldo. Admin only.
pub async fn recalculate_all_saldos(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<RecalculateAllResponse>> {
    let report =
        bulk::recalculate_all_for_caller(state.store.as_ref(), &caller, state.policy).await?;
    Ok(Json(RecalculateAllResponse {
        success: true,
        report,
    }))
}

/// Queues a record change; the recompute happens in the background.
pub async fn record_changes(
    State(state): State<AppState>,
    caller: Caller,
    Json(event): Json<RecordChanged>,
) -> StatusCode {
    tracing::debug!(
        kind = event.kind.as_str(),
        reported_by = %caller.user_id,
        "Record change received"
    );
    state.feed.notify(event).await;
    StatusCode::ACCEPTED
}
