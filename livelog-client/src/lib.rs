//! # livelog-client
//!
//! Client library for livelog console streaming.
//!
//! This is the main library that applications use to follow an instance
//! console.
//!
//! ## Features
//!
//! - **Buffered + live merge**: history from the buffer endpoint and lines from
//!   the live stream end up in one deduplicated log
//! - **Explicit status**: `loading`, `buffered`, `live-no-buffer`, `live`,
//!   `closed`, `error`, `no-permission`
//! - **Transport Abstraction**: Pluggable stream and fetch layers (WebSocket
//!   and HTTP, or mocks)
//! - **Pure State Machine**: Uses livelog-core for side-effect-free logic
//!
//! ## Example
//!
//! ```ignore
//! use livelog_client::{ConsoleSubscriber, CoreContext, HttpBufferFetcher, WebSocketConnector};
//! use tokio::sync::watch;
//!
//! let (context_tx, context_rx) = watch::channel(CoreContext::new("localhost", 16662));
//! let subscriber = ConsoleSubscriber::new(
//!     WebSocketConnector::new(),
//!     HttpBufferFetcher::default(),
//!     context_rx,
//! );
//! let mut subscription = subscriber.subscribe("INSTANCE_abc");
//!
//! while subscription.changed().await {
//!     let view = subscription.view();
//!     println!("{} ({} lines)", view.status, view.log.len());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod context;
pub mod diagnostics;
pub mod error;
pub mod fetch;
pub mod principal;
mod stream;
pub mod subscription;
pub mod transport;

pub use context::CoreContext;
pub use diagnostics::{DiagnosticsSink, MemoryDiagnostics, TracingDiagnostics};
pub use error::ClientError;
pub use fetch::{
    decode_buffer, BufferFetcher, BufferFormat, FetchRequest, HttpBufferFetcher, MockFetcher,
    PendingFetch,
};
pub use principal::{HttpPrincipalSource, PrincipalSource};
pub use subscription::{ConsoleSubscriber, ConsoleSubscription, ConsoleView};
pub use transport::{
    Frame, MockConnector, MockRemote, StreamConnection, StreamConnector, TransportError,
    WebSocketConnector,
};

pub use livelog_core::{ConnectionStatus, LogSequence};
pub use livelog_types::{InstanceUuid, LogRecord, Principal};
