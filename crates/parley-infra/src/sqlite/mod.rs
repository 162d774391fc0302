//! SQLite storage layer.
//!
//! Split read/write pools in WAL mode, a generic SQL repository driven by
//! per-entity descriptors, the unit of work that owns writer transactions,
//! and the read-side credential store.

pub mod credential_store;
pub mod entity;
pub mod pool;
pub mod repository;
pub mod unit_of_work;
