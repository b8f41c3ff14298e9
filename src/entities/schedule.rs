//! Schedule entity - A planned shift ("Soll-Zeit") for one user.
//!
//! The duration between `start_time` and `end_time` counts toward the user's scheduled hours.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Schedule database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schedules")]
pub struct Model {
    /// Unique identifier for the schedule
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the shift
    pub user_id: String,
    /// Short label shown in the calendar
    pub title: String,
    /// Planned start of the shift
    pub start_time: DateTimeUtc,
    /// Planned end of the shift
    pub end_time: DateTimeUtc,
    /// Optional work location
    pub location: Option<String>,
    /// Optional shift type (e.g., "early", "late")
    pub shift_type: Option<String>,
    /// Optional department the shift is planned for
    pub department_id: Option<i64>,
    /// When the schedule was created
    pub created_at: DateTimeUtc,
    /// When the schedule was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Schedule and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each schedule belongs to one profile
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id"
    )]
    Profile,
    /// Each schedule optionally belongs to one department
    #[sea_orm(
        belongs_to = "super::department::Entity",
        from = "Column::DepartmentId",
        to = "super::department::Column::Id"
    )]
    Department,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl Related<super::department::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
