//! Stream transport abstraction for livelog.
//!
//! This module provides a pluggable transport layer that abstracts the
//! connection carrying live console messages (WebSocket, mock for testing).
//!
//! # Design
//!
//! The transport is connection-oriented and receive-only:
//! - `StreamConnector::connect()` opens one connection to a stream URL
//! - `StreamConnection::recv()` yields text frames until a close frame
//! - `StreamConnection::close()` terminates from our side
//!
//! # Example
//!
//! ```ignore
//! let connector = MockConnector::new();
//! let mut connection = connector.connect("ws://core/stream").await?;
//! while let Some(frame) = connection.recv().await {
//!     println!("{:?}", frame?);
//! }
//! ```

mod mock;
mod websocket;

pub use mock::{MockConnection, MockConnector, MockRemote};
pub use websocket::{WebSocketConnection, WebSocketConnector};

use async_trait::async_trait;
use livelog_types::CloseCode;
use thiserror::Error;

/// One frame delivered by a stream connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// A text payload, expected to hold one JSON event.
    Text(String),
    /// The remote closed the stream with this code.
    Close(CloseCode),
}

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed.
    #[error("connection closed")]
    ConnectionClosed,

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),
}

/// Opens stream connections.
///
/// Implementations handle the underlying mechanism (WebSocket, mock).
#[async_trait]
pub trait StreamConnector: Send + Sync + 'static {
    /// Connection type produced by this connector.
    type Connection: StreamConnection;

    /// Open a connection to `url`.
    ///
    /// Resolves once the remote has accepted the connection.
    async fn connect(&self, url: &str) -> Result<Self::Connection, TransportError>;
}

/// An open stream connection.
#[async_trait]
pub trait StreamConnection: Send + 'static {
    /// Next frame from the remote.
    ///
    /// `None` means the stream ended without a close frame.
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>>;

    /// Close the connection from our side.
    async fn close(&mut self) -> Result<(), TransportError>;
}
