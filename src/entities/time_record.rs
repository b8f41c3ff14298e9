//! Time record entity - A check-in/check-out pair ("Ist-Zeit") for one user.
//!
//! Records with a `check_out` of `None` are still open and do not count toward worked hours.
//! `total_hours` is filled in on check-out; when it is missing the duration is derived from the
//! two timestamps.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Time record database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "timerecords")]
pub struct Model {
    /// Unique identifier for the time record
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of the record
    pub user_id: String,
    /// When the user checked in
    pub check_in: DateTimeUtc,
    /// When the user checked out, `None` while the record is open
    pub check_out: Option<DateTimeUtc>,
    /// Precomputed worked hours, if stored
    pub total_hours: Option<f64>,
    /// When the record was created
    pub created_at: DateTimeUtc,
    /// When the record was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between `TimeRecord` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each time record belongs to one profile
    #[sea_orm(
        belongs_to = "super::profile::Entity",
        from = "Column::UserId",
        to = "super::profile::Column::Id"
    )]
    Profile,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
