//! Record write API handlers
//!
//! POST /create-schedule    - plan a shift (admin or manager)
//! POST /update-schedule    - move a shift (admin or manager)
//! POST /delete-schedule    - remove a shift (admin or manager)
//! POST /check-in           - open a time record for the caller
//! POST /check-out          - close a time record (owner, admin or manager)
//! POST /delete-time-record - remove a time record (admin or manager)
//!
//! Every successful write queues a saldo recompute on the change feed.

use axum::Json;
use axum::extract::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AppState;
use crate::core::access::require_role;
use crate::core::records::{self, NewSchedule};
use crate::core::{Caller, Role};
use crate::entities::{schedule, time_record};
use crate::errors::Result;

const PLANNERS: &[Role] = &[Role::Admin, Role::Manager];

/// A schedule as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleView {
    /// Schedule id
    pub id: i64,
    /// Owner id
    pub user_id: String,
    /// Shift label
    pub title: String,
    /// Planned start
    pub start_time: DateTime<Utc>,
    /// Planned end
    pub end_time: DateTime<Utc>,
    /// Work location
    pub location: Option<String>,
    /// Shift type
    pub shift_type: Option<String>,
    /// Department id
    pub department_id: Option<i64>,
}

impl From<schedule::Model> for ScheduleView {
    fn from(model: schedule::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            start_time: model.start_time,
            end_time: model.end_time,
            location: model.location,
            shift_type: model.shift_type,
            department_id: model.department_id,
        }
    }
}

/// A time record as returned to clients.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRecordView {
    /// Record id
    pub id: i64,
    /// Owner id
    pub user_id: String,
    /// Check-in instant
    pub check_in: DateTime<Utc>,
    /// Check-out instant, `None` while open
    pub check_out: Option<DateTime<Utc>>,
    /// Worked hours, set on check-out
    pub total_hours: Option<f64>,
}

impl From<time_record::Model> for TimeRecordView {
    fn from(model: time_record::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            check_in: model.check_in,
            check_out: model.check_out,
            total_hours: model.total_hours,
        }
    }
}

/// Response carrying one schedule.
#[derive(Debug, Serialize)]
pub struct ScheduleResponse {
    /// Always `true`
    pub success: bool,
    /// The stored schedule
    pub schedule: ScheduleView,
}

/// Response carrying one time record.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRecordResponse {
    /// Always `true`
    pub success: bool,
    /// The stored time record
    pub time_record: TimeRecordView,
}

/// Response of the delete operations.
#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    /// Always `true`
    pub success: bool,
}

/// Body of `POST /create-schedule`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateScheduleRequest {
    /// Owner of the shift
    pub user_id: String,
    /// Shift label
    #[serde(default)]
    pub title: String,
    /// Planned start
    pub start_time: DateTime<Utc>,
    /// Planned end
    pub end_time: DateTime<Utc>,
    /// Work location
    pub location: Option<String>,
    /// Shift type
    pub shift_type: Option<String>,
    /// Department id
    pub department_id: Option<i64>,
}

/// Body of `POST /update-schedule`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScheduleRequest {
    /// Schedule to move
    pub schedule_id: i64,
    /// New start
    pub start_time: DateTime<Utc>,
    /// New end
    pub end_time: DateTime<Utc>,
}

/// Body of `POST /delete-schedule`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleIdRequest {
    /// Schedule to remove
    pub schedule_id: i64,
}

/// Body of `POST /check-out` and `POST /delete-time-record`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordIdRequest {
    /// Time record to close or remove
    pub record_id: i64,
}

/// Plans a shift for a user.
pub async fn create_schedule(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<CreateScheduleRequest>,
) -> Result<Json<ScheduleResponse>> {
    require_role(state.store.as_ref(), &caller, PLANNERS).await?;
    let created = records::create_schedule(
        state.store.connection(),
        &state.feed,
        NewSchedule {
            user_id: req.user_id,
            title: req.title,
            start_time: req.start_time,
            end_time: req.end_time,
            location: req.location,
            shift_type: req.shift_type,
            department_id: req.department_id,
        },
    )
    .await?;
    Ok(Json(ScheduleResponse {
        success: true,
        schedule: created.into(),
    }))
}

/// Moves a shift to new times.
pub async fn update_schedule(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<UpdateScheduleRequest>,
) -> Result<Json<ScheduleResponse>> {
    require_role(state.store.as_ref(), &caller, PLANNERS).await?;
    let updated = records::update_schedule_times(
        state.store.connection(),
        &state.feed,
        req.schedule_id,
        req.start_time,
        req.end_time,
    )
    .await?;
    Ok(Json(ScheduleResponse {
        success: true,
        schedule: updated.into(),
    }))
}

/// Removes a shift.
pub async fn delete_schedule(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<ScheduleIdRequest>,
) -> Result<Json<DeletedResponse>> {
    require_role(state.store.as_ref(), &caller, PLANNERS).await?;
    records::delete_schedule(state.store.connection(), &state.feed, req.schedule_id).await?;
    Ok(Json(DeletedResponse { success: true }))
}

/// Opens a time record for the caller at the current instant.
pub async fn check_in(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<TimeRecordResponse>> {
    let created =
        records::check_in(state.store.connection(), &state.feed, &caller.user_id, Utc::now())
            .await?;
    Ok(Json(TimeRecordResponse {
        success: true,
        time_record: created.into(),
    }))
}

/// Closes a time record at the current instant.
pub async fn check_out(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<RecordIdRequest>,
) -> Result<Json<TimeRecordResponse>> {
    let db = state.store.connection();
    let record = records::find_time_record(db, req.record_id).await?;
    if record.user_id != caller.user_id {
        require_role(state.store.as_ref(), &caller, PLANNERS).await?;
    }

    let closed = records::check_out(db, &state.feed, req.record_id, Utc::now()).await?;
    Ok(Json(TimeRecordResponse {
        success: true,
        time_record: closed.into(),
    }))
}

/// Removes a time record.
pub async fn delete_time_record(
    State(state): State<AppState>,
    caller: Caller,
    Json(req): Json<RecordIdRequest>,
) -> Result<Json<DeletedResponse>> {
    require_role(state.store.as_ref(), &caller, PLANNERS).await?;
    records::delete_time_record(state.store.connection(), &state.feed, req.record_id).await?;
    Ok(Json(DeletedResponse { success: true }))
}
