//! # livelog-core
//!
//! Pure logic for livelog (no I/O, instant tests).
//!
//! This crate implements the merging, normalization, access and status
//! logic for a console subscription without any network I/O, enabling
//! fast unit tests.
//!
//! ## Design Philosophy
//!
//! All modules in this crate are **pure** - they take input and produce output
//! without side effects. The status machine returns the actions to perform
//! (open the stream, issue the fetch, merge records) instead of performing
//! them.
//!
//! The actual I/O (WebSocket, HTTP) is performed by `livelog-client`, which
//! interprets the actions produced by these state machines.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod access;
pub mod merge;
pub mod normalize;
pub mod status;

pub use access::{can_access, Authorizer, Capability, PermissionAuthorizer};
pub use merge::{merge, LogSequence};
pub use normalize::{normalize, normalize_json};
pub use status::{Action, ConnectionStatus, Event};
