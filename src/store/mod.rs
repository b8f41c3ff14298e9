//! Concrete [`crate::core::store::SaldoStore`] implementations.

/// In-process document store
pub mod document;
/// SeaORM-backed relational store
pub mod relational;

pub use document::DocumentStore;
pub use relational::RelationalStore;
