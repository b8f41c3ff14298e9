//! Saldo calculation - pure aggregation of scheduled versus worked hours.
//!
//! Scheduled hours ("Soll") are the sum of all schedule spans. Worked hours ("Ist") are the sum of
//! all completed time records, using the stored `total_hours` when it is set and the check-in to
//! check-out span otherwise. The saldo is worked minus scheduled.
//!
//! All three figures are rounded to two decimal places independently of each other. The saldo is
//! rounded from the unrounded difference, so it can differ by one hundredth from the difference
//! of the two rounded totals.

use crate::errors::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

const SECONDS_PER_HOUR: f64 = 3600.0;

/// How malformed records are treated during aggregation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvalidRecordPolicy {
    /// Drop the record's contribution and log a warning
    #[default]
    Skip,
    /// Fail the whole calculation with [`Error::InvalidRecord`]
    Reject,
}

/// A planned shift as seen by the calculator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSpan {
    /// Identifier used in diagnostics
    pub record_id: String,
    /// Planned start, `None` if the stored value is missing or unreadable
    pub start: Option<DateTime<Utc>>,
    /// Planned end, `None` if the stored value is missing or unreadable
    pub end: Option<DateTime<Utc>>,
}

/// A check-in/check-out entry as seen by the calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkEntry {
    /// Identifier used in diagnostics
    pub record_id: String,
    /// Check-in instant, `None` if the stored value is missing or unreadable
    pub check_in: Option<DateTime<Utc>>,
    /// Check-out instant, `None` while the entry is still open
    pub check_out: Option<DateTime<Utc>>,
    /// Stored worked hours, if any
    pub total_hours: Option<f64>,
}

/// Everything the calculator needs for one user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserRecords {
    /// All of the user's schedules
    pub schedules: Vec<ScheduleSpan>,
    /// The user's time records; open entries may be included and are ignored
    pub time_records: Vec<WorkEntry>,
}

/// Rounded totals for one user.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaldoResult {
    /// Sum of all scheduled hours
    pub scheduled_hours: f64,
    /// Sum of all worked hours from completed time records
    pub worked_hours: f64,
    /// Worked minus scheduled hours
    pub saldo: f64,
}

/// Rounds to two decimal places, halves away from zero.
#[must_use]
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Hours between two instants; negative when `end` precedes `start`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn hours_between(start: DateTime<Utc>, end: DateTime<Utc>) -> f64 {
    (end - start).num_milliseconds() as f64 / 1000.0 / SECONDS_PER_HOUR
}

fn reject_or_skip(policy: InvalidRecordPolicy, record_id: &str, reason: &str) -> Result<()> {
    match policy {
        InvalidRecordPolicy::Skip => {
            warn!(record_id, reason, "Skipping malformed record in saldo calculation");
            Ok(())
        }
        InvalidRecordPolicy::Reject => Err(Error::InvalidRecord {
            record_id: record_id.to_string(),
            reason: reason.to_string(),
        }),
    }
}

fn schedule_hours(span: &ScheduleSpan, policy: InvalidRecordPolicy) -> Result<f64> {
    match (span.start, span.end) {
        (Some(start), Some(end)) => Ok(hours_between(start, end)),
        (None, _) => reject_or_skip(policy, &span.record_id, "schedule has no start time")
            .map(|()| 0.0),
        (_, None) => {
            reject_or_skip(policy, &span.record_id, "schedule has no end time").map(|()| 0.0)
        }
    }
}

fn entry_hours(entry: &WorkEntry, policy: InvalidRecordPolicy) -> Result<f64> {
    let Some(check_out) = entry.check_out else {
        // Open entries never count.
        return Ok(0.0);
    };

    match entry.total_hours {
        Some(hours) if !hours.is_finite() => {
            reject_or_skip(policy, &entry.record_id, "total hours is not a finite number")
                .map(|()| 0.0)
        }
        // A stored zero is treated as "not set".
        Some(hours) if hours != 0.0 => Ok(hours),
        Some(_) => Ok(entry
            .check_in
            .map_or(0.0, |check_in| hours_between(check_in, check_out))),
        None => match entry.check_in {
            Some(check_in) => Ok(hours_between(check_in, check_out)),
            None => reject_or_skip(policy, &entry.record_id, "time record has no check-in time")
                .map(|()| 0.0),
        },
    }
}

/// Computes the rounded scheduled hours, worked hours and saldo for one user's records.
///
/// # Errors
/// Returns [`Error::InvalidRecord`] for the first malformed record when `policy` is
/// [`InvalidRecordPolicy::Reject`]. With [`InvalidRecordPolicy::Skip`] this never fails.
pub fn calculate_saldo(records: &UserRecords, policy: InvalidRecordPolicy) -> Result<SaldoResult> {
    let mut scheduled_hours = 0.0;
    for span in &records.schedules {
        scheduled_hours += schedule_hours(span, policy)?;
    }

    let mut worked_hours = 0.0;
    for entry in &records.time_records {
        worked_hours += entry_hours(entry, policy)?;
    }

    let saldo = worked_hours - scheduled_hours;

    Ok(SaldoResult {
        scheduled_hours: round2(scheduled_hours),
        worked_hours: round2(worked_hours),
        saldo: round2(saldo),
    })
}
