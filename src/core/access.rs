//! Roles and role-gated access.
//!
//! Authentication happens upstream; by the time a [`Caller`] exists the identity is trusted.
//! Authorization always consults the role stored in the backend, never a role claimed by the
//! request.

use crate::core::store::SaldoStore;
use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

/// A user's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular staff member
    Employee,
    /// Team lead who plans shifts
    Manager,
    /// Full administrative access
    Admin,
}

impl Role {
    /// Stored string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Manager => "manager",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "employee" => Ok(Self::Employee),
            "manager" => Ok(Self::Manager),
            "admin" => Ok(Self::Admin),
            _ => Err(Error::invalid_argument("Invalid role")),
        }
    }
}

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// The caller's user id
    pub user_id: String,
}

impl Caller {
    /// Creates a caller, rejecting an empty identity.
    pub fn new(user_id: impl Into<String>) -> Result<Self> {
        let user_id = user_id.into();
        if user_id.trim().is_empty() {
            return Err(Error::Unauthenticated);
        }
        Ok(Self { user_id })
    }
}

/// Checks that the caller's stored role is one of `allowed` and returns it.
///
/// # Errors
/// Returns [`Error::PermissionDenied`] if the caller has no profile or a role outside `allowed`.
pub async fn require_role(
    store: &dyn SaldoStore,
    caller: &Caller,
    allowed: &[Role],
) -> Result<Role> {
    match store.find_role(&caller.user_id).await? {
        Some(role) if allowed.contains(&role) => Ok(role),
        role => {
            warn!(
                user_id = %caller.user_id,
                role = ?role,
                "Rejected caller without required role"
            );
            let required = allowed
                .iter()
                .map(|r| r.as_str())
                .collect::<Vec<_>>()
                .join(" or ");
            Err(Error::permission_denied(format!("{required} role required")))
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::store::document::{DocumentStore, UserDocument};

    #[test]
    fn test_role_round_trip_strings() {
        for role in [Role::Employee, Role::Manager, Role::Admin] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!(matches!(
            "superuser".parse::<Role>(),
            Err(Error::InvalidArgument { .. })
        ));
        assert!("Admin".parse::<Role>().is_err());
    }

    #[test]
    fn test_empty_caller_is_unauthenticated() {
        assert!(matches!(Caller::new("  "), Err(Error::Unauthenticated)));
        assert_eq!(Caller::new("u1").unwrap().user_id, "u1");
    }

    #[tokio::test]
    async fn test_require_role() -> Result<()> {
        let store = DocumentStore::new();
        store
            .put_user("boss", UserDocument::new("boss@example.com", "admin"))
            .await;
        store
            .put_user("lead", UserDocument::new("lead@example.com", "manager"))
            .await;
        store
            .put_user("worker", UserDocument::new("worker@example.com", "employee"))
            .await;

        let admin = Caller::new("boss")?;
        assert_eq!(require_role(&store, &admin, &[Role::Admin]).await?, Role::Admin);

        let manager = Caller::new("lead")?;
        assert_eq!(
            require_role(&store, &manager, &[Role::Admin, Role::Manager]).await?,
            Role::Manager
        );
        assert!(matches!(
            require_role(&store, &manager, &[Role::Admin]).await,
            Err(Error::PermissionDenied { .. })
        ));

        let employee = Caller::new("worker")?;
        assert!(matches!(
            require_role(&store, &employee, &[Role::Admin, Role::Manager]).await,
            Err(Error::PermissionDenied { .. })
        ));

        let stranger = Caller::new("nobody")?;
        assert!(matches!(
            require_role(&store, &stranger, &[Role::Admin]).await,
            Err(Error::PermissionDenied { .. })
        ));

        Ok(())
    }
}
