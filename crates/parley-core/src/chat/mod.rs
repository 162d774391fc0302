//! Chat orchestration for Parley.
//!
//! - `service`: chat lifecycle composed over the unit of work and the
//!   completion provider
//! - `title`: title derivation from the first assistant reply

pub mod service;
pub mod title;
