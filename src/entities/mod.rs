//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod department;
pub mod profile;
pub mod schedule;
pub mod time_record;

// Re-export specific types to avoid conflicts
pub use department::{Column as DepartmentColumn, Entity as Department, Model as DepartmentModel};
pub use profile::{Column as ProfileColumn, Entity as Profile, Model as ProfileModel};
pub use schedule::{Column as ScheduleColumn, Entity as Schedule, Model as ScheduleModel};
pub use time_record::{
    Column as TimeRecordColumn, Entity as TimeRecord, Model as TimeRecordModel,
};
