//! Bulk recalculation of every user's saldo.
//!
//! Used to repair cached balances after imports or after changing the invalid-record policy.
//! One user's failure is recorded in that user's entry; the batch always runs to the end.

use crate::core::access::{Caller, Role, require_role};
use crate::core::recalc::recalculate_user;
use crate::core::saldo::{InvalidRecordPolicy, SaldoResult};
use crate::core::store::SaldoStore;
use crate::errors::Result;
use serde::Serialize;
use tracing::{info, warn};

/// Result of recomputing one user during a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecalcOutcome {
    /// The recomputed user
    pub user_id: String,
    /// Whether the recompute succeeded
    pub success: bool,
    /// Stored result on success
    #[serde(flatten)]
    pub result: Option<SaldoResult>,
    /// Error description on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary of a bulk run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRecalcReport {
    /// One entry per user, in the order users were listed
    pub results: Vec<UserRecalcOutcome>,
    /// Number of users processed
    pub total_processed: usize,
}

impl BulkRecalcReport {
    /// Number of users whose recompute failed.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.success).count()
    }
}

/// Recomputes the saldo of every known user, one after another.
///
/// # Errors
/// Fails only if the list of users cannot be read.
pub async fn recalculate_all_saldos(
    store: &dyn SaldoStore,
    policy: InvalidRecordPolicy,
) -> Result<BulkRecalcReport> {
    let user_ids = store.list_user_ids().await?;
    info!("Recalculating hours saldo for {} users", user_ids.len());

    let mut results = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
        let outcome = match recalculate_user(store, &user_id, policy).await {
            Ok(result) => UserRecalcOutcome {
                user_id,
                success: true,
                result: Some(result),
                error: None,
            },
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Saldo recompute failed during bulk run");
                UserRecalcOutcome {
                    user_id,
                    success: false,
                    result: None,
                    error: Some(e.to_string()),
                }
            }
        };
        results.push(outcome);
    }

    let report = BulkRecalcReport {
        total_processed: results.len(),
        results,
    };
    info!(
        total = report.total_processed,
        failed = report.failed_count(),
        "Bulk saldo recalculation finished"
    );
    Ok(report)
}

/// Admin-only bulk recalculation.
///
/// # Errors
/// Returns [`crate::errors::Error::PermissionDenied`] unless the caller is an admin.
pub async fn recalculate_all_for_caller(
    store: &dyn SaldoStore,
    caller: &Caller,
    policy: InvalidRecordPolicy,
) -> Result<BulkRecalcReport> {
    require_role(store, caller, &[Role::Admin]).await?;
    recalculate_all_saldos(store, policy).await
}
