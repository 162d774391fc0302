//! Credential and session lifecycle.
//!
//! - `password`: one-way hashing port and password policy
//! - `store`: identity lookup port used when resolving credentials
//! - `token`: access/refresh issuance, verification and rotation
//! - `account`: registration, login and refresh built on the above

pub mod account;
pub mod password;
pub mod store;
pub mod token;
