//! Shared domain types for Parley.
//!
//! Users, chats, messages, credential claims, completion turns, process
//! configuration and the error enums every layer returns.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror, secrecy.

pub mod chat;
pub mod config;
pub mod credential;
pub mod error;
pub mod llm;
pub mod user;
