//! Per-user saldo recomputation.
//!
//! [`recalculate_user`] is the one pipeline shared by the change trigger, the bulk recalculation
//! and the callable operation: read the user's records, calculate, write the saldo back.

use crate::core::access::Caller;
use crate::core::saldo::{InvalidRecordPolicy, SaldoResult, calculate_saldo};
use crate::core::store::SaldoStore;
use crate::errors::{Error, Result};
use tracing::{error, info};

/// Recomputes and stores the saldo of one user.
///
/// There is no lock between the read and the write. A concurrent change can leave a briefly
/// stale value, which the trigger for that change overwrites.
pub async fn recalculate_user(
    store: &dyn SaldoStore,
    user_id: &str,
    policy: InvalidRecordPolicy,
) -> Result<SaldoResult> {
    let records = store.fetch_user_records(user_id).await?;
    let result = calculate_saldo(&records, policy)?;
    store.write_saldo(user_id, &result).await?;

    info!(
        user_id,
        saldo = result.saldo,
        scheduled_hours = result.scheduled_hours,
        worked_hours = result.worked_hours,
        "Hours saldo recalculated"
    );
    Ok(result)
}

/// Callable entry point: recomputes `user_id`'s saldo on behalf of an authenticated caller.
///
/// # Errors
/// * [`Error::InvalidArgument`] if `user_id` is empty
/// * [`Error::UserNotFound`] if the user has no profile
/// * backend errors, which surface as `internal`
pub async fn calculate_hours_saldo(
    store: &dyn SaldoStore,
    caller: &Caller,
    user_id: &str,
    policy: InvalidRecordPolicy,
) -> Result<SaldoResult> {
    if user_id.trim().is_empty() {
        return Err(Error::invalid_argument("userId is required"));
    }

    recalculate_user(store, user_id, policy)
        .await
        .inspect_err(|e| {
            error!(
                user_id,
                caller = %caller.user_id,
                operation = "calculate_hours_saldo",
                error = %e,
                "Error calculating hours saldo"
            );
        })
}
