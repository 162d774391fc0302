//! Infrastructure layer for Parley.
//!
//! Implements the ports defined in `parley-core`: SQLite storage (generic
//! repository, unit of work, credential store), Argon2 password hashing,
//! HS256 JWT credentials, the OpenAI-compatible completion client, and the
//! configuration loader.

pub mod config;
pub mod crypto;
pub mod llm;
pub mod sqlite;
