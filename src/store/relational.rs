//! Relational store - SeaORM over `SQLite` or `PostgreSQL`.
//!
//! Reads come from the `schedules` and `timerecords` tables, the saldo is written to `profiles`.
//! Open time records are filtered out in the query itself.

use crate::core::access::Role;
use crate::core::saldo::{SaldoResult, ScheduleSpan, UserRecords, WorkEntry};
use crate::core::store::SaldoStore;
use crate::entities::{Profile, Schedule, TimeRecord, profile, schedule, time_record};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use sea_orm::{ActiveValue::Unchanged, QueryOrder, QuerySelect, Set, prelude::*};
use tracing::{debug, warn};

impl From<&schedule::Model> for ScheduleSpan {
    fn from(model: &schedule::Model) -> Self {
        Self {
            record_id: model.id.to_string(),
            start: Some(model.start_time),
            end: Some(model.end_time),
        }
    }
}

impl From<&time_record::Model> for WorkEntry {
    fn from(model: &time_record::Model) -> Self {
        Self {
            record_id: model.id.to_string(),
            check_in: Some(model.check_in),
            check_out: model.check_out,
            total_hours: model.total_hours,
        }
    }
}

/// [`SaldoStore`] backed by a SeaORM connection.
#[derive(Debug, Clone)]
pub struct RelationalStore {
    db: DatabaseConnection,
}

impl RelationalStore {
    /// Wraps an open connection.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The underlying connection, for operations outside the saldo pipeline.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Loads a profile by id, failing with [`Error::UserNotFound`] if it does not exist.
pub async fn get_profile<C>(db: &C, user_id: &str) -> Result<profile::Model>
where
    C: ConnectionTrait,
{
    Profile::find_by_id(user_id.to_string())
        .one(db)
        .await?
        .ok_or_else(|| Error::UserNotFound {
            user_id: user_id.to_string(),
        })
}

#[async_trait]
impl SaldoStore for RelationalStore {
    async fn fetch_user_records(&self, user_id: &str) -> Result<UserRecords> {
        let schedules = Schedule::find()
            .filter(schedule::Column::UserId.eq(user_id))
            .order_by_asc(schedule::Column::StartTime)
            .all(&self.db)
            .await?;

        let time_records = TimeRecord::find()
            .filter(time_record::Column::UserId.eq(user_id))
            .filter(time_record::Column::CheckOut.is_not_null())
            .order_by_asc(time_record::Column::CheckIn)
            .all(&self.db)
            .await?;

        Ok(UserRecords {
            schedules: schedules.iter().map(ScheduleSpan::from).collect(),
            time_records: time_records.iter().map(WorkEntry::from).collect(),
        })
    }

    #[allow(clippy::float_cmp)]
    async fn write_saldo(&self, user_id: &str, result: &SaldoResult) -> Result<()> {
        let profile = get_profile(&self.db, user_id).await?;
        if profile.hours_saldo == result.saldo {
            debug!(user_id, "Stored saldo already current");
            return Ok(());
        }

        // Only the saldo and the timestamp are marked as set; every other column stays as stored.
        let update = profile::ActiveModel {
            id: Unchanged(profile.id),
            hours_saldo: Set(result.saldo),
            updated_at: Set(chrono::Utc::now()),
            ..Default::default()
        };
        update.update(&self.db).await?;
        Ok(())
    }

    async fn list_user_ids(&self) -> Result<Vec<String>> {
        Profile::find()
            .select_only()
            .column(profile::Column::Id)
            .order_by_asc(profile::Column::Id)
            .into_tuple::<String>()
            .all(&self.db)
            .await
            .map_err(Into::into)
    }

    async fn find_role(&self, user_id: &str) -> Result<Option<Role>> {
        let Some(profile) = Profile::find_by_id(user_id.to_string()).one(&self.db).await? else {
            return Ok(None);
        };

        match profile.role.parse() {
            Ok(role) => Ok(Some(role)),
            Err(_) => {
                warn!(user_id, role = %profile.role, "Profile has an unknown role");
                Ok(None)
            }
        }
    }
}
