//! Cryptographic adapters for Parley.
//!
//! - `password`: Argon2id password hashing
//! - `jwt`: HS256 signing and decoding of access/refresh credentials

pub mod jwt;
pub mod password;
