//! Business logic and port definitions for Parley.
//!
//! This crate defines the "ports" (repository, unit of work, credential and
//! completion traits) that the infrastructure layer implements. It depends
//! only on `parley-types` -- never on `parley-infra` or any database/IO crate.

pub mod auth;
pub mod chat;
pub mod llm;
pub mod repository;
