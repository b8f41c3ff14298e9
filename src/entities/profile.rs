//! Profile entity - One row per user of the service.
//!
//! The `id` is the identity provider's user id. `hours_saldo` is a cached value derived from the
//! user's schedules and time records and can always be recomputed from them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Profile database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profiles")]
pub struct Model {
    /// User id assigned by the identity provider
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Login email address
    pub email: String,
    /// Given name, if known
    pub first_name: Option<String>,
    /// Family name, if known
    pub last_name: Option<String>,
    /// Stored role: `"employee"`, `"manager"` or `"admin"`
    pub role: String,
    /// Department the user belongs to
    pub department_id: Option<i64>,
    /// Net hours balance (worked minus scheduled), two decimal places
    pub hours_saldo: f64,
    /// Whether the account is active
    pub is_active: bool,
    /// When the profile was created
    pub created_at: DateTimeUtc,
    /// When the profile was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Profile and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each profile optionally belongs to one department
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,
    /// One profile has many schedules
    #[sea_orm(has_many = "super::schedule::Entity")]
    Schedules,
    /// One profile has many time records
    #[sea_orm(has_many = "super::time_record::Entity")]
    TimeRecords,
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedules.def()
    }
}

impl Related<super::time_record::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TimeRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
