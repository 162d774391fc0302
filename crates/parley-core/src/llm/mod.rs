//! Completion provider port and its type-erased wrapper.

pub mod box_provider;
pub mod provider;
