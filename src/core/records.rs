//! Schedule and time record writes.
//!
//! Each successful write is reported to the [`ChangeFeed`] with the record's before/after state so
//! the owner's saldo is recomputed in the background. The feed is notified only after the write
//! is stored; the write's own result never depends on the recompute.

use crate::{
    core::saldo::{hours_between, round2},
    core::trigger::{ChangeFeed, RecordChanged, RecordKind, RecordSnapshot},
    entities::{Schedule, TimeRecord, schedule, time_record},
    errors::{Error, Result},
    store::relational::get_profile,
};
use chrono::{DateTime, Utc};
use sea_orm::{Set, prelude::*};
use tracing::info;

/// Input for [`create_schedule`].
#[derive(Debug, Clone)]
pub struct NewSchedule {
    /// Owner of the shift
    pub user_id: String,
    /// Label shown in the calendar
    pub title: String,
    /// Planned start
    pub start_time: DateTime<Utc>,
    /// Planned end
    pub end_time: DateTime<Utc>,
    /// Optional work location
    pub location: Option<String>,
    /// Optional shift type
    pub shift_type: Option<String>,
    /// Optional department
    pub department_id: Option<i64>,
}

fn validate_span(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if end <= start {
        return Err(Error::invalid_argument(
            "Schedule end time must be after its start time",
        ));
    }
    Ok(())
}

async fn find_schedule(db: &DatabaseConnection, schedule_id: i64) -> Result<schedule::Model> {
    Schedule::find_by_id(schedule_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::RecordNotFound {
            kind: RecordKind::Schedule.as_str(),
            id: schedule_id.to_string(),
        })
}

/// Loads a time record, failing with [`Error::RecordNotFound`] if it does not exist.
pub async fn find_time_record(db: &DatabaseConnection, record_id: i64) -> Result<time_record::Model> {
    TimeRecord::find_by_id(record_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::RecordNotFound {
            kind: RecordKind::TimeRecord.as_str(),
            id: record_id.to_string(),
        })
}

/// Creates a planned shift for an existing user.
///
/// # Errors
/// * [`Error::InvalidArgument`] if the title is empty or the span is empty or reversed
/// * [`Error::UserNotFound`] if the owner has no profile
pub async fn create_schedule(
    db: &DatabaseConnection,
    feed: &ChangeFeed,
    new: NewSchedule,
) -> Result<schedule::Model> {
    if new.title.trim().is_empty() {
        return Err(Error::invalid_argument("Schedule title cannot be empty"));
    }
    validate_span(new.start_time, new.end_time)?;
    get_profile(db, &new.user_id).await?;

    let now = Utc::now();
    let model = schedule::ActiveModel {
        user_id: Set(new.user_id),
        title: Set(new.title.trim().to_string()),
        start_time: Set(new.start_time),
        end_time: Set(new.end_time),
        location: Set(new.location),
        shift_type: Set(new.shift_type),
        department_id: Set(new.department_id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(schedule_id = created.id, user_id = %created.user_id, "Schedule created");

    feed.notify(RecordChanged::created(
        RecordKind::Schedule,
        RecordSnapshot::from(&created),
    ))
    .await;
    Ok(created)
}

/// Moves a planned shift to new start and end times.
pub async fn update_schedule_times(
    db: &DatabaseConnection,
    feed: &ChangeFeed,
    schedule_id: i64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<schedule::Model> {
    validate_span(start_time, end_time)?;
    let existing = find_schedule(db, schedule_id).await?;
    let before = RecordSnapshot::from(&existing);

    let mut model: schedule::ActiveModel = existing.into();
    model.start_time = Set(start_time);
    model.end_time = Set(end_time);
    model.updated_at = Set(Utc::now());
    let updated = model.update(db).await?;

    feed.notify(RecordChanged::updated(
        RecordKind::Schedule,
        before,
        RecordSnapshot::from(&updated),
    ))
    .await;
    Ok(updated)
}

/// Deletes a planned shift.
pub async fn delete_schedule(
    db: &DatabaseConnection,
    feed: &ChangeFeed,
    schedule_id: i64,
) -> Result<()> {
    let existing = find_schedule(db, schedule_id).await?;
    let before = RecordSnapshot::from(&existing);
    existing.delete(db).await?;
    info!(schedule_id, "Schedule deleted");

    feed.notify(RecordChanged::deleted(RecordKind::Schedule, before))
        .await;
    Ok(())
}

/// Opens a new time record for a user.
///
/// An open record does not change the saldo, but the feed is still notified so every write is
/// followed by a recompute.
pub async fn check_in(
    db: &DatabaseConnection,
    feed: &ChangeFeed,
    user_id: &str,
    at: DateTime<Utc>,
) -> Result<time_record::Model> {
    get_profile(db, user_id).await?;

    let now = Utc::now();
    let model = time_record::ActiveModel {
        user_id: Set(user_id.to_string()),
        check_in: Set(at),
        check_out: Set(None),
        total_hours: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    let created = model.insert(db).await?;
    info!(record_id = created.id, user_id, "Checked in");

    feed.notify(RecordChanged::created(
        RecordKind::TimeRecord,
        RecordSnapshot::from(&created),
    ))
    .await;
    Ok(created)
}

/// Closes an open time record and stores its worked hours.
///
/// # Errors
/// * [`Error::InvalidArgument`] if the record is already closed or `at` precedes the check-in
/// * [`Error::RecordNotFound`] if the record does not exist
pub async fn check_out(
    db: &DatabaseConnection,
    feed: &ChangeFeed,
    record_id: i64,
    at: DateTime<Utc>,
) -> Result<time_record::Model> {
    let existing = find_time_record(db, record_id).await?;
    if existing.check_out.is_some() {
        return Err(Error::invalid_argument("Time record is already checked out"));
    }
    if at < existing.check_in {
        return Err(Error::invalid_argument(
            "Check-out cannot be earlier than check-in",
        ));
    }

    let before = RecordSnapshot::from(&existing);
    let total_hours = round2(hours_between(existing.check_in, at));

    let mut model: time_record::ActiveModel = existing.into();
    model.check_out = Set(Some(at));
    model.total_hours = Set(Some(total_hours));
    model.updated_at = Set(Utc::now());
    let updated = model.update(db).await?;
    info!(record_id, total_hours, "Checked out");

    feed.notify(RecordChanged::updated(
        RecordKind::TimeRecord,
        before,
        RecordSnapshot::from(&updated),
    ))
    .await;
    Ok(updated)
}

/// Deletes a time record.
pub async fn delete_time_record(
    db: &DatabaseConnection,
    feed: &ChangeFeed,
    record_id: i64,
) -> Result<()> {
    let existing = find_time_record(db, record_id).await?;
    let before = RecordSnapshot::from(&existing);
    existing.delete(db).await?;
    info!(record_id, "Time record deleted");

    feed.notify(RecordChanged::deleted(RecordKind::TimeRecord, before))
        .await;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::core::saldo::InvalidRecordPolicy;
    use crate::core::store::SaldoStore;
    use crate::store::relational::RelationalStore;
    use crate::test_utils::{create_test_profile, hours_from, setup_test_db};
    use std::sync::Arc;
    use tokio::task::JoinHandle;

    fn start_feed(db: &DatabaseConnection) -> (ChangeFeed, JoinHandle<()>) {
        let store: Arc<dyn SaldoStore> = Arc::new(RelationalStore::new(db.clone()));
        ChangeFeed::spawn(store, InvalidRecordPolicy::Skip, 8)
    }

    fn shift(user_id: &str, start: f64, end: f64) -> NewSchedule {
        NewSchedule {
            user_id: user_id.to_string(),
            title: "Early".to_string(),
            start_time: hours_from(start),
            end_time: hours_from(end),
            location: Some("Front desk".to_string()),
            shift_type: None,
            department_id: None,
        }
    }

    #[tokio::test]
    async fn test_writes_keep_saldo_in_sync() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_profile(&db, "u1", "employee").await?;
        let (feed, worker) = start_feed(&db);

        let schedule = create_schedule(&db, &feed, shift("u1", 8.0, 16.0)).await?;
        let record = check_in(&db, &feed, "u1", hours_from(8.25)).await?;
        let record = check_out(&db, &feed, record.id, hours_from(17.0)).await?;
        assert_eq!(record.total_hours, Some(8.75));
        assert_eq!(schedule.location.as_deref(), Some("Front desk"));

        drop(feed);
        worker.await.unwrap();

        let profile = get_profile(&db, "u1").await?;
        assert_eq!(profile.hours_saldo, 0.75);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_and_move_schedule() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_profile(&db, "u1", "employee").await?;
        let (feed, worker) = start_feed(&db);

        let first = create_schedule(&db, &feed, shift("u1", 8.0, 12.0)).await?;
        let second = create_schedule(&db, &feed, shift("u1", 13.0, 15.0)).await?;
        update_schedule_times(&db, &feed, second.id, hours_from(13.0), hours_from(17.0)).await?;
        delete_schedule(&db, &feed, first.id).await?;

        drop(feed);
        worker.await.unwrap();

        assert_eq!(get_profile(&db, "u1").await?.hours_saldo, -4.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_time_record_recomputes() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_profile(&db, "u1", "employee").await?;
        let (feed, worker) = start_feed(&db);

        let record = check_in(&db, &feed, "u1", hours_from(9.0)).await?;
        check_out(&db, &feed, record.id, hours_from(11.0)).await?;
        delete_time_record(&db, &feed, record.id).await?;

        drop(feed);
        worker.await.unwrap();

        assert_eq!(get_profile(&db, "u1").await?.hours_saldo, 0.0);
        assert!(TimeRecord::find_by_id(record.id).one(&db).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_write_validation() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_profile(&db, "u1", "employee").await?;
        let (feed, _worker) = start_feed(&db);

        let err = create_schedule(&db, &feed, shift("u1", 12.0, 8.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let mut untitled = shift("u1", 8.0, 12.0);
        untitled.title = "  ".to_string();
        let err = create_schedule(&db, &feed, untitled).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let err = create_schedule(&db, &feed, shift("ghost", 8.0, 12.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UserNotFound { .. }));

        let record = check_in(&db, &feed, "u1", hours_from(9.0)).await?;
        let err = check_out(&db, &feed, record.id, hours_from(8.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        check_out(&db, &feed, record.id, hours_from(10.0)).await?;
        let err = check_out(&db, &feed, record.id, hours_from(11.0))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let err = delete_schedule(&db, &feed, 999).await.unwrap_err();
        assert!(matches!(err, Error::RecordNotFound { kind: "schedule", .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_write_succeeds_when_feed_is_closed() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_profile(&db, "u1", "employee").await?;
        let (feed, worker) = start_feed(&db);

        worker.abort();
        assert!(worker.await.unwrap_err().is_cancelled());

        let created = create_schedule(&db, &feed, shift("u1", 8.0, 12.0)).await?;
        assert!(Schedule::find_by_id(created.id).one(&db).await?.is_some());

        // Nothing recomputed the saldo.
        assert_eq!(get_profile(&db, "u1").await?.hours_saldo, 0.0);
        Ok(())
    }
}
