//! # livelog-types
//!
//! Wire format types for livelog console streaming.
//!
//! This crate provides the foundational types used across all livelog crates:
//! - [`InstanceUuid`], [`IdempotencyKey`] - Identity types
//! - [`ClientEvent`] - The event envelope pushed by the core server
//! - [`LogRecord`] - The normalized console line the client keeps
//! - [`CloseCode`] - WebSocket close codes that decide the final status
//! - [`Principal`] - The user the client is acting as
//! - [`ConsoleError`] - Error types

#![warn(missing_docs)]
#![warn(clippy::all)]

mod close;
mod error;
mod event;
mod ids;
mod principal;
mod record;

pub use close::CloseCode;
pub use error::ConsoleError;
pub use event::{CausedBy, ClientEvent, EventInner, InstanceEvent, InstanceEventInner};
pub use ids::{IdempotencyKey, InstanceUuid};
pub use principal::{Principal, UserPermission};
pub use record::LogRecord;
