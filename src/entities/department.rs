//! Department entity - Organisational unit that profiles and schedules can reference.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Department database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "departments")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name (e.g., "Kitchen", "Front desk")
    pub name: String,
    /// Colour used when rendering the department's shifts
    pub color_code: String,
    /// When the department was created
    pub created_at: DateTimeUtc,
    /// When the department was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Department and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One department has many profiles
    #[sea_orm(has_many = "super::profile::Entity")]
    Profiles,
    /// One department has many schedules
    #[sea_orm(has_many = "super::schedule::Entity")]
    Schedules,
}

impl Related<super::profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Profiles.def()
    }
}

impl Related<super::schedule::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schedules.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
