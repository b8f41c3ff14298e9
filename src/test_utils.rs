//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases and creating test
//! entities with sensible defaults. Times are given as fractional hours after midnight of a fixed
//! day, so `hours_from(8.25)` is 08:15.

use crate::{
    api::AppState,
    core::{ChangeFeed, InvalidRecordPolicy, SaldoStore},
    entities::{department, profile, schedule, time_record},
    errors::Result,
    store::{
        RelationalStore,
        document::{DocumentStore, UserDocument},
    },
};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tower::ServiceExt;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// The instant `hours` hours after midnight UTC on 2024-03-04.
///
/// # Panics
/// Never for the fixed base date.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn hours_from(hours: f64) -> DateTime<Utc> {
    #[allow(clippy::unwrap_used)]
    let midnight = Utc.with_ymd_and_hms(2024, 3, 4, 0, 0, 0).unwrap();
    midnight + Duration::seconds((hours * 3600.0).round() as i64)
}

/// Inserts a profile with the given role.
///
/// # Defaults
/// * `email`: `"{user_id}@example.com"`
/// * `first_name`: `"Test"`, `last_name`: `user_id`
/// * `hours_saldo`: 0.0
pub async fn create_test_profile(
    db: &DatabaseConnection,
    user_id: &str,
    role: &str,
) -> Result<profile::Model> {
    let now = Utc::now();
    let model = profile::ActiveModel {
        id: Set(user_id.to_string()),
        email: Set(format!("{user_id}@example.com")),
        first_name: Set(Some("Test".to_string())),
        last_name: Set(Some(user_id.to_string())),
        role: Set(role.to_string()),
        department_id: Set(None),
        hours_saldo: Set(0.0),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };
    Ok(model.insert(db).await?)
}

/// Inserts a department.
pub async fn create_test_department(
    db: &DatabaseConnection,
    name: &str,
) -> Result<department::Model> {
    let now = Utc::now();
    let model = department::ActiveModel {
        name: Set(name.to_string()),
        color_code: Set("#336699".to_string()),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Inserts a schedule directly, without notifying any change feed.
pub async fn create_test_schedule(
    db: &DatabaseConnection,
    user_id: &str,
    start_hour: f64,
    end_hour: f64,
) -> Result<schedule::Model> {
    let now = Utc::now();
    let model = schedule::ActiveModel {
        user_id: Set(user_id.to_string()),
        title: Set("Shift".to_string()),
        start_time: Set(hours_from(start_hour)),
        end_time: Set(hours_from(end_hour)),
        location: Set(None),
        shift_type: Set(None),
        department_id: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Inserts a time record directly, without notifying any change feed.
pub async fn create_test_time_record(
    db: &DatabaseConnection,
    user_id: &str,
    check_in_hour: f64,
    check_out_hour: Option<f64>,
    total_hours: Option<f64>,
) -> Result<time_record::Model> {
    let now = Utc::now();
    let model = time_record::ActiveModel {
        user_id: Set(user_id.to_string()),
        check_in: Set(hours_from(check_in_hour)),
        check_out: Set(check_out_hour.map(hours_from)),
        total_hours: Set(total_hours),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Adds a user document with the given role to a document store.
pub async fn seed_document_user(store: &DocumentStore, user_id: &str, role: &str) {
    store
        .put_user(user_id, UserDocument::new(format!("{user_id}@example.com"), role))
        .await;
}

/// Builds API state over a fresh in-memory database with a running change feed worker.
///
/// The worker stops once the returned state and every clone of it have been dropped.
pub async fn setup_test_app() -> Result<(AppState, JoinHandle<()>)> {
    let db = setup_test_db().await?;
    let store = Arc::new(RelationalStore::new(db));
    let worker_store = Arc::clone(&store) as Arc<dyn SaldoStore>;
    let (feed, worker) = ChangeFeed::spawn(worker_store, InvalidRecordPolicy::Skip, 16);
    let state = AppState {
        store,
        feed,
        policy: InvalidRecordPolicy::Skip,
    };
    Ok((state, worker))
}

/// Sends a JSON POST through the router, optionally as `caller`, and returns status and body.
///
/// # Panics
/// Panics if the request cannot be built or the response body is not JSON.
#[allow(clippy::unwrap_used)]
pub async fn post_json(
    app: Router,
    uri: &str,
    caller: Option<&str>,
    body: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let mut request = Request::post(uri).header("content-type", "application/json");
    if let Some(user_id) = caller {
        request = request.header(crate::api::auth::USER_ID_HEADER, user_id);
    }
    let request = request.body(Body::from(body.to_string())).unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}
