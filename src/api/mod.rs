//! HTTP surface.
//!
//! Every route except `/health` needs an authenticated [`Caller`](crate::core::Caller), taken from
//! the `x-user-id` header set by the identity proxy in front of the service.

pub mod admin;
pub mod auth;
pub mod error;
pub mod health;
pub mod records;
pub mod saldo;
pub mod users;

use crate::core::{ChangeFeed, InvalidRecordPolicy};
use crate::store::RelationalStore;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Profile, schedule and time record storage
    pub store: Arc<RelationalStore>,
    /// Queue for record changes reported by external writers
    pub feed: ChangeFeed,
    /// How malformed completed time records are treated
    pub policy: InvalidRecordPolicy,
}

/// Create the combined router
pub fn create_router(state: AppState) -> Router {
    // Saldo operations (authenticated)
    let saldo = Router::new()
        .route("/calculate-hours-saldo", post(saldo::calculate_hours_saldo))
        .route("/recalculate-all-saldos", post(saldo::recalculate_all_saldos))
        .route("/record-changes", post(saldo::record_changes));

    // Administration (role checked per operation)
    let admin = Router::new()
        .route("/update-user-role", post(admin::update_user_role))
        .route("/export-data", post(admin::export_data));

    // Profile lifecycle (caller's own profile, or admin)
    let users = Router::new()
        .route("/create-user-profile", post(users::create_user_profile))
        .route("/delete-user", post(users::delete_user));

    // Record writes, each followed by a queued recompute
    let records = Router::new()
        .route("/create-schedule", post(records::create_schedule))
        .route("/update-schedule", post(records::update_schedule))
        .route("/delete-schedule", post(records::delete_schedule))
        .route("/check-in", post(records::check_in))
        .route("/check-out", post(records::check_out))
        .route("/delete-time-record", post(records::delete_time_record));

    Router::new()
        .route("/health", get(health::health_check))
        .merge(saldo)
        .merge(admin)
        .merge(users)
        .merge(records)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
