//! Change trigger - keeps `hours_saldo` in sync with schedule and time record writes.
//!
//! Every write to a schedule or time record is described by a [`RecordChanged`] event carrying
//! the record's state before and after the write. Handling an event recomputes the saldo of the
//! affected user. Recompute failures are logged and reported as [`TriggerOutcome::Failed`], they
//! never reach the writer that caused the event.
//!
//! [`ChangeFeed`] decouples writers from recomputation: events go into a bounded channel and a
//! background task drains them one by one.

use crate::core::recalc::recalculate_user;
use crate::core::saldo::{InvalidRecordPolicy, SaldoResult};
use crate::core::store::SaldoStore;
use crate::entities::{schedule, time_record};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Which collection the changed record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordKind {
    /// A planned shift
    Schedule,
    /// A check-in/check-out entry
    TimeRecord,
}

impl RecordKind {
    /// Name used in logs and error messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Schedule => "schedule",
            Self::TimeRecord => "timerecord",
        }
    }
}

/// The parts of a record the trigger cares about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSnapshot {
    /// Id of the changed record
    pub record_id: String,
    /// Owner of the record, if the stored record has one
    #[serde(default)]
    pub user_id: Option<String>,
}

impl From<&schedule::Model> for RecordSnapshot {
    fn from(model: &schedule::Model) -> Self {
        Self {
            record_id: model.id.to_string(),
            user_id: Some(model.user_id.clone()),
        }
    }
}

impl From<&time_record::Model> for RecordSnapshot {
    fn from(model: &time_record::Model) -> Self {
        Self {
            record_id: model.id.to_string(),
            user_id: Some(model.user_id.clone()),
        }
    }
}

/// A create, update or delete of one schedule or time record.
///
/// `before` is `None` for a create, `after` is `None` for a delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordChanged {
    /// Collection of the changed record
    pub kind: RecordKind,
    /// State before the write
    #[serde(default)]
    pub before: Option<RecordSnapshot>,
    /// State after the write
    #[serde(default)]
    pub after: Option<RecordSnapshot>,
}

fn owner(snapshot: Option<&RecordSnapshot>) -> Option<&str> {
    snapshot
        .and_then(|s| s.user_id.as_deref())
        .filter(|id| !id.trim().is_empty())
}

impl RecordChanged {
    /// Event for a newly created record.
    #[must_use]
    pub const fn created(kind: RecordKind, after: RecordSnapshot) -> Self {
        Self {
            kind,
            before: None,
            after: Some(after),
        }
    }

    /// Event for an updated record.
    #[must_use]
    pub const fn updated(kind: RecordKind, before: RecordSnapshot, after: RecordSnapshot) -> Self {
        Self {
            kind,
            before: Some(before),
            after: Some(after),
        }
    }

    /// Event for a deleted record.
    #[must_use]
    pub const fn deleted(kind: RecordKind, before: RecordSnapshot) -> Self {
        Self {
            kind,
            before: Some(before),
            after: None,
        }
    }

    /// The user whose saldo the change affects.
    ///
    /// Taken from the after-state when the record still exists, otherwise from the before-state.
    #[must_use]
    pub fn affected_user(&self) -> Option<&str> {
        match &self.after {
            Some(after) => owner(Some(after)),
            None => owner(self.before.as_ref()),
        }
    }

    /// The previous owner, when an update moved the record to a different user or left it ownerless.
    #[must_use]
    pub fn previous_owner(&self) -> Option<&str> {
        self.after.as_ref()?;
        let before = owner(self.before.as_ref())?;
        (self.affected_user() != Some(before)).then_some(before)
    }
}

/// What handling one event did for one user.
#[derive(Debug, Clone, PartialEq)]
pub enum TriggerOutcome {
    /// No user could be resolved from the event
    Skipped,
    /// The user's saldo was recomputed and stored
    Recalculated {
        /// Recomputed user
        user_id: String,
        /// Stored result
        result: SaldoResult,
    },
    /// Recomputing the user's saldo failed
    Failed {
        /// User whose recompute failed
        user_id: String,
        /// Error description
        message: String,
    },
}

async fn recalculate_for_event(
    store: &dyn SaldoStore,
    event: &RecordChanged,
    user_id: &str,
    policy: InvalidRecordPolicy,
) -> TriggerOutcome {
    match recalculate_user(store, user_id, policy).await {
        Ok(result) => TriggerOutcome::Recalculated {
            user_id: user_id.to_string(),
            result,
        },
        Err(e) => {
            error!(
                user_id,
                kind = event.kind.as_str(),
                error = %e,
                "Saldo recompute after record change failed"
            );
            TriggerOutcome::Failed {
                user_id: user_id.to_string(),
                message: e.to_string(),
            }
        }
    }
}

/// Recomputes the saldo of the user affected by `event`.
///
/// If the write moved a record away from a user, to another user or to no owner at all, the
/// previous owner is recomputed as well. Never fails; problems are logged and returned as outcomes.
pub async fn handle_record_changed(
    store: &dyn SaldoStore,
    event: &RecordChanged,
    policy: InvalidRecordPolicy,
) -> Vec<TriggerOutcome> {
    let users: Vec<&str> = event
        .affected_user()
        .into_iter()
        .chain(event.previous_owner())
        .collect();
    if users.is_empty() {
        info!(kind = event.kind.as_str(), "No userId found for record change");
        return vec![TriggerOutcome::Skipped];
    }

    let mut outcomes = Vec::with_capacity(users.len());
    for user_id in users {
        debug!(user_id, kind = event.kind.as_str(), "Handling record change");
        outcomes.push(recalculate_for_event(store, event, user_id, policy).await);
    }
    outcomes
}

/// Sender side of the background change feed.
#[derive(Clone)]
pub struct ChangeFeed {
    sender: mpsc::Sender<RecordChanged>,
}

impl ChangeFeed {
    /// Starts the background worker and returns the feed plus the worker's handle.
    ///
    /// The worker stops once every clone of the returned feed has been dropped and all queued
    /// events are handled.
    ///
    /// # Panics
    /// Panics if `capacity` is zero.
    #[must_use]
    pub fn spawn(
        store: Arc<dyn SaldoStore>,
        policy: InvalidRecordPolicy,
        capacity: usize,
    ) -> (Self, JoinHandle<()>) {
        let (sender, receiver) = mpsc::channel(capacity);
        let worker = tokio::spawn(run_change_worker(store, policy, receiver));
        (Self { sender }, worker)
    }

    /// Queues an event for recomputation.
    ///
    /// Waits while the queue is full. A stopped worker is logged and otherwise ignored, so the
    /// write that produced the event is never affected.
    pub async fn notify(&self, event: RecordChanged) {
        if let Err(e) = self.sender.send(event).await {
            warn!(
                kind = e.0.kind.as_str(),
                "Change feed is closed, dropping record change"
            );
        }
    }
}

async fn run_change_worker(
    store: Arc<dyn SaldoStore>,
    policy: InvalidRecordPolicy,
    mut receiver: mpsc::Receiver<RecordChanged>,
) {
    info!("Change feed worker started");
    while let Some(event) = receiver.recv().await {
        handle_record_changed(store.as_ref(), &event, policy).await;
    }
    info!("Change feed worker stopped");
}
