//! Persistence seam for the saldo pipeline.
//!
//! The calculation never talks to a database directly. Callers pass in a [`SaldoStore`], which
//! keeps the pipeline identical across the relational and document backends and lets tests run
//! against an in-process store.

use crate::core::access::Role;
use crate::core::saldo::{SaldoResult, UserRecords};
use crate::errors::Result;
use async_trait::async_trait;

/// Reads a user's schedules and time records and writes back the computed saldo.
#[async_trait]
pub trait SaldoStore: Send + Sync {
    /// Returns all schedules and completed time records owned by `user_id`, and nothing else.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    async fn fetch_user_records(&self, user_id: &str) -> Result<UserRecords>;

    /// Stores `result.saldo` as the user's `hours_saldo` and bumps the update timestamp.
    ///
    /// Only those two fields change. Writing a saldo equal to the stored one leaves the profile
    /// untouched, so repeated writes of the same result produce the same state.
    ///
    /// # Errors
    /// Returns [`crate::errors::Error::UserNotFound`] if the profile does not exist.
    async fn write_saldo(&self, user_id: &str, result: &SaldoResult) -> Result<()>;

    /// Ids of every known user.
    async fn list_user_ids(&self) -> Result<Vec<String>>;

    /// The stored role of `user_id`, `None` if the user is unknown.
    async fn find_role(&self, user_id: &str) -> Result<Option<Role>>;
}
