//! Data export - flattened schedule and time record rows for reporting.

use crate::{
    core::access::{Caller, Role, require_role},
    entities::{Department, Profile, Schedule, TimeRecord, profile, schedule, time_record},
    errors::{Error, Result},
    store::relational::RelationalStore,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{QueryOrder, prelude::*};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt, str::FromStr};
use tracing::info;

/// Which collections an export covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportType {
    /// Time records only
    TimeRecords,
    /// Schedules only
    Schedules,
    /// Time records followed by schedules
    All,
}

impl ExportType {
    const fn includes_time_records(self) -> bool {
        matches!(self, Self::TimeRecords | Self::All)
    }

    const fn includes_schedules(self) -> bool {
        matches!(self, Self::Schedules | Self::All)
    }

    /// Wire name of the export type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TimeRecords => "timerecords",
            Self::Schedules => "schedules",
            Self::All => "all",
        }
    }
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "timerecords" => Ok(Self::TimeRecords),
            "schedules" => Ok(Self::Schedules),
            "all" => Ok(Self::All),
            _ => Err(Error::invalid_argument("Invalid export type")),
        }
    }
}

/// Export parameters as received from a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportRequest {
    /// `timerecords`, `schedules` or `all`
    pub export_type: String,
    /// Inclusive lower bound, RFC 3339 or `YYYY-MM-DD`
    pub start_date: Option<String>,
    /// Inclusive upper bound, RFC 3339 or `YYYY-MM-DD`
    pub end_date: Option<String>,
    /// Limit the export to one user
    pub user_id: Option<String>,
}

/// One exported time record with its owner's contact details.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRecordRow {
    /// Record id
    pub id: i64,
    /// Owner id
    pub user_id: String,
    /// Owner's first name, empty if unknown
    pub user_first_name: String,
    /// Owner's last name, empty if unknown
    pub user_last_name: String,
    /// Owner's email, empty if unknown
    pub user_email: String,
    /// Check-in instant
    pub check_in: DateTime<Utc>,
    /// Check-out instant, `None` while open
    pub check_out: Option<DateTime<Utc>>,
    /// Stored worked hours
    pub total_hours: Option<f64>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// One exported schedule with owner and department details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleRow {
    /// Schedule id
    pub id: i64,
    /// Owner id
    pub user_id: String,
    /// Owner's first name, empty if unknown
    pub user_first_name: String,
    /// Owner's last name, empty if unknown
    pub user_last_name: String,
    /// Owner's email, empty if unknown
    pub user_email: String,
    /// Shift label
    pub title: String,
    /// Planned start
    pub start_time: DateTime<Utc>,
    /// Planned end
    pub end_time: DateTime<Utc>,
    /// Work location, empty if unset
    pub location: String,
    /// Shift type, empty if unset
    pub shift_type: String,
    /// Department id
    pub department_id: Option<i64>,
    /// Department name, empty if unknown
    pub department_name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// One exported row, tagged with `recordType`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "recordType", rename_all = "camelCase")]
pub enum ExportRow {
    /// A time record
    TimeRecord(TimeRecordRow),
    /// A schedule
    Schedule(ScheduleRow),
}

/// Result of [`export_data`]. Time record rows come before schedule rows.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResponse {
    /// Number of rows in `data`
    pub record_count: usize,
    /// Requested export type
    pub export_type: ExportType,
    /// Exported rows
    pub data: Vec<ExportRow>,
}

/// Parses a filter bound given either as RFC 3339 or as a plain `YYYY-MM-DD` date.
///
/// A plain date as upper bound covers the whole day.
fn parse_bound(value: &str, end_of_day: bool) -> Result<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| Error::invalid_argument(format!("Invalid date: {value}")))?;
    let time = if end_of_day {
        NaiveTime::from_hms_milli_opt(23, 59, 59, 999)
    } else {
        Some(NaiveTime::MIN)
    };
    time.map(|t| date.and_time(t).and_utc())
        .ok_or_else(|| Error::invalid_argument(format!("Invalid date: {value}")))
}

/// Date range and owner filters shared by both collections.
#[derive(Debug, Default)]
struct ExportFilter {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    user_id: Option<String>,
}

impl ExportFilter {
    fn from_request(request: &ExportRequest) -> Result<Self> {
        Ok(Self {
            start: non_empty(&request.start_date)
                .map(|v| parse_bound(v, false))
                .transpose()?,
            end: non_empty(&request.end_date)
                .map(|v| parse_bound(v, true))
                .transpose()?,
            user_id: non_empty(&request.user_id).map(str::to_string),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

struct Owner {
    first_name: String,
    last_name: String,
    email: String,
}

impl Owner {
    fn lookup(profiles: &HashMap<String, profile::Model>, user_id: &str) -> Self {
        profiles.get(user_id).map_or_else(
            || Self {
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
            },
            |p| Self {
                first_name: p.first_name.clone().unwrap_or_default(),
                last_name: p.last_name.clone().unwrap_or_default(),
                email: p.email.clone(),
            },
        )
    }
}

async fn export_time_records(
    db: &DatabaseConnection,
    filter: &ExportFilter,
    profiles: &HashMap<String, profile::Model>,
) -> Result<Vec<ExportRow>> {
    let mut query = TimeRecord::find();
    if let Some(start) = filter.start {
        query = query.filter(time_record::Column::CheckIn.gte(start));
    }
    if let Some(end) = filter.end {
        query = query.filter(time_record::Column::CheckIn.lte(end));
    }
    if let Some(user_id) = &filter.user_id {
        query = query.filter(time_record::Column::UserId.eq(user_id.as_str()));
    }
    let records = query
        .order_by_asc(time_record::Column::CheckIn)
        .all(db)
        .await?;

    Ok(records
        .into_iter()
        .map(|r| {
            let owner = Owner::lookup(profiles, &r.user_id);
            ExportRow::TimeRecord(TimeRecordRow {
                id: r.id,
                user_id: r.user_id,
                user_first_name: owner.first_name,
                user_last_name: owner.last_name,
                user_email: owner.email,
                check_in: r.check_in,
                check_out: r.check_out,
                total_hours: r.total_hours,
                created_at: r.created_at,
                updated_at: r.updated_at,
            })
        })
        .collect())
}

async fn export_schedules(
    db: &DatabaseConnection,
    filter: &ExportFilter,
    profiles: &HashMap<String, profile::Model>,
) -> Result<Vec<ExportRow>> {
    let mut query = Schedule::find();
    if let Some(start) = filter.start {
        query = query.filter(schedule::Column::StartTime.gte(start));
    }
    if let Some(end) = filter.end {
        query = query.filter(schedule::Column::StartTime.lte(end));
    }
    if let Some(user_id) = &filter.user_id {
        query = query.filter(schedule::Column::UserId.eq(user_id.as_str()));
    }
    let schedules = query
        .order_by_asc(schedule::Column::StartTime)
        .all(db)
        .await?;

    let departments: HashMap<i64, String> = Department::find()
        .all(db)
        .await?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();

    Ok(schedules
        .into_iter()
        .map(|s| {
            let owner = Owner::lookup(profiles, &s.user_id);
            let department_name = s
                .department_id
                .and_then(|id| departments.get(&id).cloned())
                .unwrap_or_default();
            ExportRow::Schedule(ScheduleRow {
                id: s.id,
                user_id: s.user_id,
                user_first_name: owner.first_name,
                user_last_name: owner.last_name,
                user_email: owner.email,
                title: s.title,
                start_time: s.start_time,
                end_time: s.end_time,
                location: s.location.unwrap_or_default(),
                shift_type: s.shift_type.unwrap_or_default(),
                department_id: s.department_id,
                department_name,
                created_at: s.created_at,
                updated_at: s.updated_at,
            })
        })
        .collect())
}

/// Exports time records and/or schedules, optionally limited to a date range and one user.
///
/// Date bounds are inclusive and apply to `check_in` for time records and `start_time` for
/// schedules.
///
/// # Errors
/// * [`Error::PermissionDenied`] unless the caller is an admin
/// * [`Error::InvalidArgument`] for an unknown export type or an unparsable date
pub async fn export_data(
    store: &RelationalStore,
    caller: &Caller,
    request: &ExportRequest,
) -> Result<ExportResponse> {
    require_role(store, caller, &[Role::Admin]).await?;
    let export_type: ExportType = request.export_type.parse()?;
    let filter = ExportFilter::from_request(request)?;

    let db = store.connection();
    let profiles: HashMap<String, profile::Model> = Profile::find()
        .all(db)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let mut data = Vec::new();
    if export_type.includes_time_records() {
        data.extend(export_time_records(db, &filter, &profiles).await?);
    }
    if export_type.includes_schedules() {
        data.extend(export_schedules(db, &filter, &profiles).await?);
    }

    info!(
        export_type = %export_type,
        record_count = data.len(),
        requested_by = %caller.user_id,
        "Data export completed"
    );
    Ok(ExportResponse {
        record_count: data.len(),
        export_type,
        data,
    })
}
