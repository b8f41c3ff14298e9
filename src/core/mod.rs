//! Core module - Framework-agnostic saldo logic.
//! Everything here works against the [`store::SaldoStore`] trait or a plain database connection,
//! so the HTTP layer and background workers share one implementation.

pub mod access;
pub mod bulk;
pub mod export;
pub mod recalc;
pub mod records;
pub mod saldo;
pub mod store;
pub mod trigger;
pub mod users;

pub use access::{Caller, Role};
pub use saldo::{InvalidRecordPolicy, SaldoResult, calculate_saldo};
pub use store::SaldoStore;
pub use trigger::{ChangeFeed, RecordChanged};
