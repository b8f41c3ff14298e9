//! User administration - profile creation and removal, role changes.

use crate::{
    core::access::{Caller, Role, require_role},
    entities::{Profile, Schedule, TimeRecord, profile, schedule, time_record},
    errors::{Error, Result},
    store::relational::{RelationalStore, get_profile},
};
use chrono::Utc;
use sea_orm::{ActiveValue::Unchanged, Set, TransactionTrait, prelude::*};
use tracing::info;

/// Input for [`create_user_profile`], as delivered by the identity provider on sign-up.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    /// Identity provider user id
    pub id: String,
    /// Login email address
    pub email: String,
    /// Full display name, split into first and last name
    pub display_name: Option<String>,
    /// Department to assign
    pub department_id: Option<i64>,
}

/// Picks the initial role from the email address.
///
/// Addresses on an `admin.` or `manager.` host become admins, `lead.` or `supervisor.` hosts
/// become managers, everybody else starts as an employee.
#[must_use]
pub fn default_role_for_email(email: &str) -> Role {
    if email.contains("@admin.") || email.contains("@manager.") {
        Role::Admin
    } else if email.contains("@lead.") || email.contains("@supervisor.") {
        Role::Manager
    } else {
        Role::Employee
    }
}

/// Splits a display name into a first name and the remaining words.
fn split_display_name(display_name: Option<&str>) -> (Option<String>, Option<String>) {
    let mut parts = display_name.unwrap_or_default().split_whitespace();
    let first = parts.next().map(str::to_string);
    let rest = parts.collect::<Vec<_>>().join(" ");
    (first, (!rest.is_empty()).then_some(rest))
}

/// Creates the profile for a newly registered user with a zero saldo.
///
/// # Errors
/// Returns [`Error::InvalidArgument`] if the id or email is empty.
pub async fn create_user_profile(db: &DatabaseConnection, new: NewUser) -> Result<profile::Model> {
    if new.id.trim().is_empty() {
        return Err(Error::invalid_argument("User id cannot be empty"));
    }
    if new.email.trim().is_empty() {
        return Err(Error::invalid_argument("Email cannot be empty"));
    }

    let role = default_role_for_email(&new.email);
    let (first_name, last_name) = split_display_name(new.display_name.as_deref());
    let now = Utc::now();

    let model = profile::ActiveModel {
        id: Set(new.id),
        email: Set(new.email),
        first_name: Set(first_name),
        last_name: Set(last_name),
        role: Set(role.as_str().to_string()),
        department_id: Set(new.department_id),
        hours_saldo: Set(0.0),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let created = model.insert(db).await?;
    info!(user_id = %created.id, role = %role, "User profile created");
    Ok(created)
}

/// Deletes a user's profile together with all of their schedules and time records.
///
/// Runs in one database transaction; either everything is removed or nothing is.
pub async fn delete_user(db: &DatabaseConnection, user_id: &str) -> Result<()> {
    let txn = db.begin().await?;

    let profile = get_profile(&txn, user_id).await?;

    let time_records = TimeRecord::delete_many()
        .filter(time_record::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    let schedules = Schedule::delete_many()
        .filter(schedule::Column::UserId.eq(user_id))
        .exec(&txn)
        .await?;
    Profile::delete_by_id(profile.id).exec(&txn).await?;

    txn.commit().await?;
    info!(
        user_id,
        schedules = schedules.rows_affected,
        time_records = time_records.rows_affected,
        "User and related data deleted"
    );
    Ok(())
}

/// Changes another user's role. Admins and managers may do this.
///
/// # Errors
/// * [`Error::InvalidArgument`] if an argument is empty or `new_role` is not a known role
/// * [`Error::PermissionDenied`] if the caller is neither admin nor manager
/// * [`Error::UserNotFound`] if the target has no profile
pub async fn update_user_role(
    store: &RelationalStore,
    caller: &Caller,
    target_user_id: &str,
    new_role: &str,
) -> Result<profile::Model> {
    if target_user_id.trim().is_empty() || new_role.trim().is_empty() {
        return Err(Error::invalid_argument(
            "targetUserId and newRole are required",
        ));
    }

    require_role(store, caller, &[Role::Admin, Role::Manager]).await?;
    let role: Role = new_role.parse()?;

    let db = store.connection();
    let target = get_profile(db, target_user_id).await?;
    let update = profile::ActiveModel {
        id: Unchanged(target.id),
        role: Set(role.as_str().to_string()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    };
    let updated = update.update(db).await?;

    info!(
        target_user_id,
        new_role = %role,
        changed_by = %caller.user_id,
        "User role updated"
    );
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::{
        create_test_profile, create_test_schedule, create_test_time_record, setup_test_db,
    };

    #[test]
    fn test_default_role_for_email() {
        assert_eq!(default_role_for_email("jo@admin.example.com"), Role::Admin);
        assert_eq!(default_role_for_email("jo@manager.example.com"), Role::Admin);
        assert_eq!(default_role_for_email("jo@lead.example.com"), Role::Manager);
        assert_eq!(
            default_role_for_email("jo@supervisor.example.com"),
            Role::Manager
        );
        assert_eq!(default_role_for_email("jo@example.com"), Role::Employee);
    }

    #[test]
    fn test_split_display_name() {
        assert_eq!(
            split_display_name(Some("Anna Maria Schmidt")),
            (Some("Anna".to_string()), Some("Maria Schmidt".to_string()))
        );
        assert_eq!(split_display_name(Some("Cher")), (Some("Cher".to_string()), None));
        assert_eq!(split_display_name(None), (None, None));
        assert_eq!(split_display_name(Some("   ")), (None, None));
    }

    #[tokio::test]
    async fn test_create_user_profile() -> Result<()> {
        let db = setup_test_db().await?;

        let profile = create_user_profile(
            &db,
            NewUser {
                id: "u1".to_string(),
                email: "anna@lead.example.com".to_string(),
                display_name: Some("Anna Schmidt".to_string()),
                department_id: None,
            },
        )
        .await?;

        assert_eq!(profile.role, "manager");
        assert_eq!(profile.first_name.as_deref(), Some("Anna"));
        assert_eq!(profile.last_name.as_deref(), Some("Schmidt"));
        assert_eq!(profile.hours_saldo, 0.0);
        assert!(profile.is_active);

        let err = create_user_profile(
            &db,
            NewUser {
                id: String::new(),
                email: "x@example.com".to_string(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_delete_user_cascades() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_profile(&db, "u1", "employee").await?;
        create_test_profile(&db, "u2", "employee").await?;
        create_test_schedule(&db, "u1", 8.0, 16.0).await?;
        create_test_time_record(&db, "u1", 8.0, Some(16.0), None).await?;
        create_test_schedule(&db, "u2", 8.0, 16.0).await?;

        delete_user(&db, "u1").await?;

        assert!(Profile::find_by_id("u1".to_string()).one(&db).await?.is_none());
        assert_eq!(
            Schedule::find()
                .filter(schedule::Column::UserId.eq("u1"))
                .count(&db)
                .await?,
            0
        );
        assert_eq!(
            TimeRecord::find()
                .filter(time_record::Column::UserId.eq("u1"))
                .count(&db)
                .await?,
            0
        );
        assert_eq!(Schedule::find().count(&db).await?, 1);

        let err = delete_user(&db, "u1").await.unwrap_err();
        assert!(matches!(err, Error::UserNotFound { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_update_user_role() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_profile(&db, "boss", "admin").await?;
        create_test_profile(&db, "lead", "manager").await?;
        create_test_profile(&db, "worker", "employee").await?;
        let store = RelationalStore::new(db);

        let admin = Caller::new("boss")?;
        let updated = update_user_role(&store, &admin, "worker", "manager").await?;
        assert_eq!(updated.role, "manager");
        assert_eq!(updated.email, "worker@example.com");

        let manager = Caller::new("lead")?;
        let updated = update_user_role(&store, &manager, "worker", "employee").await?;
        assert_eq!(updated.role, "employee");

        let employee = Caller::new("worker")?;
        let err = update_user_role(&store, &employee, "lead", "employee")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::PermissionDenied { .. }));

        let err = update_user_role(&store, &admin, "worker", "overlord")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let err = update_user_role(&store, &admin, "", "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));

        let err = update_user_role(&store, &admin, "ghost", "admin")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UserNotFound { .. }));
        Ok(())
    }
}
