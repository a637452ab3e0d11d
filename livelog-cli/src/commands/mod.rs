//! CLI command implementations.

pub mod buffer;
pub mod tail;
