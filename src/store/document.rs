//! Document-style store.
//!
//! Keeps `users`, `schedules` and `timerecords` collections of loosely typed documents in memory.
//! Document fields are optional, the way they are in a schemaless database, so a document can
//! lack an owner or a timestamp. Writes to schedules and time records hand back the
//! [`RecordChanged`] event describing them, ready to be fed to the change trigger.

use crate::core::access::Role;
use crate::core::saldo::{SaldoResult, ScheduleSpan, UserRecords, WorkEntry};
use crate::core::store::SaldoStore;
use crate::core::trigger::{RecordChanged, RecordKind, RecordSnapshot};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// A document in the `users` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    /// Login email address
    pub email: String,
    /// Given name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default)]
    pub last_name: Option<String>,
    /// Stored role string
    pub role: String,
    /// Cached saldo
    #[serde(default, rename = "hours_saldo")]
    pub hours_saldo: f64,
    /// Set whenever the saldo is written
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
}

impl UserDocument {
    /// A fresh user document with a zero saldo.
    #[must_use]
    pub fn new(email: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            first_name: None,
            last_name: None,
            role: role.into(),
            hours_saldo: 0.0,
            last_updated: None,
        }
    }
}

/// A document in the `schedules` collection.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDocument {
    /// Owner of the shift
    #[serde(default)]
    pub user_id: Option<String>,
    /// Label shown in the calendar
    #[serde(default)]
    pub title: Option<String>,
    /// Planned start
    #[serde(default)]
    pub start_time: Option<DateTime<Utc>>,
    /// Planned end
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

impl ScheduleDocument {
    /// A complete schedule document.
    #[must_use]
    pub fn new(user_id: &str, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            title: None,
            start_time: Some(start_time),
            end_time: Some(end_time),
        }
    }
}

/// A document in the `timerecords` collection.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRecordDocument {
    /// Owner of the record
    #[serde(default)]
    pub user_id: Option<String>,
    /// Check-in instant
    #[serde(default)]
    pub check_in: Option<DateTime<Utc>>,
    /// Check-out instant, absent while open
    #[serde(default)]
    pub check_out: Option<DateTime<Utc>>,
    /// Precomputed worked hours
    #[serde(default)]
    pub total_hours: Option<f64>,
}

impl TimeRecordDocument {
    /// An open record (checked in, not yet out).
    #[must_use]
    pub fn open(user_id: &str, check_in: DateTime<Utc>) -> Self {
        Self {
            user_id: Some(user_id.to_string()),
            check_in: Some(check_in),
            check_out: None,
            total_hours: None,
        }
    }

    /// A completed record without stored hours.
    #[must_use]
    pub fn completed(user_id: &str, check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Self {
        Self {
            check_out: Some(check_out),
            ..Self::open(user_id, check_in)
        }
    }

    /// Sets the stored worked hours.
    #[must_use]
    pub const fn with_total_hours(mut self, total_hours: f64) -> Self {
        self.total_hours = Some(total_hours);
        self
    }
}

#[derive(Debug, Default)]
struct Collections {
    users: BTreeMap<String, UserDocument>,
    schedules: BTreeMap<String, ScheduleDocument>,
    timerecords: BTreeMap<String, TimeRecordDocument>,
}

/// In-process document store.
#[derive(Debug, Default)]
pub struct DocumentStore {
    collections: RwLock<Collections>,
}

fn snapshot(record_id: &str, user_id: Option<&String>) -> RecordSnapshot {
    RecordSnapshot {
        record_id: record_id.to_string(),
        user_id: user_id.cloned(),
    }
}

fn change_event(
    kind: RecordKind,
    record_id: &str,
    before: Option<Option<&String>>,
    after: Option<Option<&String>>,
) -> RecordChanged {
    RecordChanged {
        kind,
        before: before.map(|owner| snapshot(record_id, owner)),
        after: after.map(|owner| snapshot(record_id, owner)),
    }
}

impl DocumentStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates or replaces a user document.
    pub async fn put_user(&self, user_id: &str, document: UserDocument) {
        let mut collections = self.collections.write().await;
        collections.users.insert(user_id.to_string(), document);
    }

    /// Reads a user document.
    pub async fn user(&self, user_id: &str) -> Option<UserDocument> {
        self.collections.read().await.users.get(user_id).cloned()
    }

    /// Reads a schedule document.
    pub async fn schedule(&self, schedule_id: &str) -> Option<ScheduleDocument> {
        self.collections
            .read()
            .await
            .schedules
            .get(schedule_id)
            .cloned()
    }

    /// Creates or replaces a schedule document and returns the change event.
    pub async fn set_schedule(&self, schedule_id: &str, document: ScheduleDocument) -> RecordChanged {
        let mut collections = self.collections.write().await;
        let event_owner = document.user_id.clone();
        let previous = collections
            .schedules
            .insert(schedule_id.to_string(), document);
        change_event(
            RecordKind::Schedule,
            schedule_id,
            previous.as_ref().map(|p| p.user_id.as_ref()),
            Some(event_owner.as_ref()),
        )
    }

    /// Deletes a schedule document and returns the change event.
    ///
    /// Deleting a missing document yields an event with neither state, which the trigger skips.
    pub async fn delete_schedule(&self, schedule_id: &str) -> RecordChanged {
        let mut collections = self.collections.write().await;
        let previous = collections.schedules.remove(schedule_id);
        change_event(
            RecordKind::Schedule,
            schedule_id,
            previous.as_ref().map(|p| p.user_id.as_ref()),
            None,
        )
    }

    /// Creates or replaces a time record document and returns the change event.
    pub async fn set_time_record(
        &self,
        record_id: &str,
        document: TimeRecordDocument,
    ) -> RecordChanged {
        let mut collections = self.collections.write().await;
        let event_owner = document.user_id.clone();
        let previous = collections
            .timerecords
            .insert(record_id.to_string(), document);
        change_event(
            RecordKind::TimeRecord,
            record_id,
            previous.as_ref().map(|p| p.user_id.as_ref()),
            Some(event_owner.as_ref()),
        )
    }

    /// Deletes a time record document and returns the change event.
    pub async fn delete_time_record(&self, record_id: &str) -> RecordChanged {
        let mut collections = self.collections.write().await;
        let previous = collections.timerecords.remove(record_id);
        change_event(
            RecordKind::TimeRecord,
            record_id,
            previous.as_ref().map(|p| p.user_id.as_ref()),
            None,
        )
    }
}

fn is_owned_by(owner: Option<&String>, user_id: &str) -> bool {
    owner.is_some_and(|owner| owner == user_id)
}

#[async_trait]
impl SaldoStore for DocumentStore {
    async fn fetch_user_records(&self, user_id: &str) -> Result<UserRecords> {
        let collections = self.collections.read().await;

        let schedules = collections
            .schedules
            .iter()
            .filter(|(_, doc)| is_owned_by(doc.user_id.as_ref(), user_id))
            .map(|(id, doc)| ScheduleSpan {
                record_id: id.clone(),
                start: doc.start_time,
                end: doc.end_time,
            })
            .collect();

        let time_records = collections
            .timerecords
            .iter()
            .filter(|(_, doc)| is_owned_by(doc.user_id.as_ref(), user_id))
            .filter(|(_, doc)| doc.check_out.is_some())
            .map(|(id, doc)| WorkEntry {
                record_id: id.clone(),
                check_in: doc.check_in,
                check_out: doc.check_out,
                total_hours: doc.total_hours,
            })
            .collect();

        Ok(UserRecords {
            schedules,
            time_records,
        })
    }

    #[allow(clippy::float_cmp)]
    async fn write_saldo(&self, user_id: &str, result: &SaldoResult) -> Result<()> {
        let mut collections = self.collections.write().await;
        let user = collections
            .users
            .get_mut(user_id)
            .ok_or_else(|| Error::UserNotFound {
                user_id: user_id.to_string(),
            })?;

        if user.hours_saldo == result.saldo && user.last_updated.is_some() {
            debug!(user_id, "Stored saldo already current");
            return Ok(());
        }

        user.hours_saldo = result.saldo;
        user.last_updated = Some(Utc::now());
        Ok(())
    }

    async fn list_user_ids(&self) -> Result<Vec<String>> {
        Ok(self.collections.read().await.users.keys().cloned().collect())
    }

    async fn find_role(&self, user_id: &str) -> Result<Option<Role>> {
        let collections = self.collections.read().await;
        let Some(user) = collections.users.get(user_id) else {
            return Ok(None);
        };

        match user.role.parse() {
            Ok(role) => Ok(Some(role)),
            Err(_) => {
                warn!(user_id, role = %user.role, "User document has an unknown role");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{hours_from, seed_document_user};

    #[tokio::test]
    async fn test_fetch_filters_by_owner_and_completion() -> Result<()> {
        let store = DocumentStore::new();
        store
            .set_schedule("s1", ScheduleDocument::new("u1", hours_from(8.0), hours_from(16.0)))
            .await;
        store
            .set_schedule("s2", ScheduleDocument::new("u2", hours_from(8.0), hours_from(16.0)))
            .await;
        store
            .set_schedule("orphan", ScheduleDocument::default())
            .await;
        store
            .set_time_record(
                "t1",
                TimeRecordDocument::completed("u1", hours_from(8.0), hours_from(12.0)),
            )
            .await;
        store
            .set_time_record("t2", TimeRecordDocument::open("u1", hours_from(13.0)))
            .await;

        let records = store.fetch_user_records("u1").await?;
        assert_eq!(records.schedules.len(), 1);
        assert_eq!(records.schedules[0].record_id, "s1");
        assert_eq!(records.time_records.len(), 1);
        assert_eq!(records.time_records[0].record_id, "t1");
        Ok(())
    }

    #[tokio::test]
    async fn test_write_saldo_is_idempotent() -> Result<()> {
        let store = DocumentStore::new();
        let mut doc = UserDocument::new("a@example.com", "employee");
        doc.first_name = Some("Anna".to_string());
        store.put_user("u1", doc).await;

        let result = SaldoResult {
            scheduled_hours: 8.0,
            worked_hours: 8.75,
            saldo: 0.75,
        };
        store.write_saldo("u1", &result).await?;
        let first = store.user("u1").await.unwrap();
        store.write_saldo("u1", &result).await?;
        let second = store.user("u1").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(second.hours_saldo, 0.75);
        assert_eq!(second.first_name.as_deref(), Some("Anna"));
        assert_eq!(second.role, "employee");
        Ok(())
    }

    #[tokio::test]
    async fn test_write_saldo_for_missing_user_fails() {
        let store = DocumentStore::new();
        let result = SaldoResult {
            scheduled_hours: 0.0,
            worked_hours: 0.0,
            saldo: 0.0,
        };
        let err = store.write_saldo("nobody", &result).await.unwrap_err();
        assert!(matches!(err, Error::UserNotFound { .. }));
    }

    #[tokio::test]
    async fn test_write_events_carry_before_and_after() {
        let store = DocumentStore::new();

        let created = store
            .set_schedule("s1", ScheduleDocument::new("u1", hours_from(8.0), hours_from(9.0)))
            .await;
        assert!(created.before.is_none());
        assert_eq!(created.affected_user(), Some("u1"));

        let updated = store
            .set_schedule("s1", ScheduleDocument::new("u1", hours_from(8.0), hours_from(10.0)))
            .await;
        assert_eq!(updated.before.as_ref().unwrap().user_id.as_deref(), Some("u1"));
        assert_eq!(updated.after.as_ref().unwrap().record_id, "s1");

        let deleted = store.delete_schedule("s1").await;
        assert!(deleted.after.is_none());
        assert_eq!(deleted.affected_user(), Some("u1"));

        let missing = store.delete_time_record("nope").await;
        assert!(missing.before.is_none() && missing.after.is_none());
        assert_eq!(missing.affected_user(), None);
    }

    #[tokio::test]
    async fn test_find_role_and_list_users() -> Result<()> {
        let store = DocumentStore::new();
        seed_document_user(&store, "b", "manager").await;
        seed_document_user(&store, "a", "admin").await;
        seed_document_user(&store, "c", "wizard").await;

        assert_eq!(store.list_user_ids().await?, vec!["a", "b", "c"]);
        assert_eq!(store.find_role("a").await?, Some(Role::Admin));
        assert_eq!(store.find_role("b").await?, Some(Role::Manager));
        assert_eq!(store.find_role("c").await?, None);
        assert_eq!(store.find_role("zzz").await?, None);
        Ok(())
    }

    #[test]
    fn test_user_document_field_names() {
        let doc = UserDocument::new("a@example.com", "admin");
        let json = serde_json::to_value(&doc).unwrap();
        assert_eq!(json["hours_saldo"], 0.0);
        assert_eq!(json["email"], "a@example.com");
        assert!(json.get("lastUpdated").is_some());
    }
}
