//! # parrot-memory
//!
//! Durable, group-scoped keyword store for Parrot (SQLite-backed).

pub mod audit;
pub mod store;

pub use audit::AuditLogger;
pub use store::Store;
