//! Console subscription status machine.
//!
//! This module provides a pure, side-effect-free state machine for the
//! lifecycle of a console subscription. The state machine takes events as
//! input and produces a new status plus a list of actions to execute.
//!
//! The status is derived from how two independent sources interleave: the
//! live stream opening and the historical buffer arriving. Whichever lands
//! second completes the pair and yields [`ConnectionStatus::Live`].
//!
//! The actual I/O (opening the stream, fetching the buffer) is performed by
//! livelog-client, not by this module.

use livelog_types::{CloseCode, LogRecord};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Externally visible phase of a console subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionStatus {
    /// The principal may not view this console.
    NoPermission,
    /// Waiting for the stream to open and the buffer to arrive.
    Loading,
    /// The buffer arrived before the stream opened.
    Buffered,
    /// Stream open and buffer merged.
    Live,
    /// The stream opened before the buffer arrived.
    LiveNoBuffer,
    /// The stream closed normally (code 1000).
    Closed,
    /// The stream closed with any other code.
    Error,
}

impl ConnectionStatus {
    /// Initial status for a new subscription.
    pub fn new() -> Self {
        Self::Loading
    }

    /// Process an event and return the new status plus actions to execute.
    ///
    /// This is a pure function - no side effects. The caller (livelog-client)
    /// is responsible for executing the returned actions, and must always pass
    /// the status as it is now, not a copy taken when the event was scheduled.
    pub fn on_event(self, event: Event) -> (Self, Vec<Action>) {
        match (self, event) {
            // Dependency changes restart the lifecycle from any status
            (_, Event::ContextChanged) => {
                (Self::Loading, vec![Action::CloseStream, Action::ResetLog])
            }
            (_, Event::PermissionDenied) => {
                (Self::NoPermission, vec![Action::CloseStream, Action::ResetLog])
            }
            (_, Event::Activated) => (
                Self::Loading,
                vec![Action::CloseStream, Action::OpenStream, Action::FetchBuffer],
            ),

            // Stream opened
            (Self::Loading, Event::StreamOpened) => (Self::LiveNoBuffer, vec![]),
            (Self::Buffered, Event::StreamOpened) => (Self::Live, vec![]),

            // Stream traffic never changes the status
            (status, Event::MessageReceived { record }) => (
                status,
                vec![Action::MergeRecords {
                    records: vec![record],
                }],
            ),

            // Closure is terminal for this connection
            (_, Event::StreamClosed { code }) if code.is_normal() => {
                (Self::Closed, vec![Action::CloseStream])
            }
            (_, Event::StreamClosed { .. }) => (Self::Error, vec![Action::CloseStream]),

            // Buffer arrived
            (Self::Loading, Event::BufferFetched { records }) => {
                (Self::Buffered, vec![Action::MergeHistory { records }])
            }
            (Self::LiveNoBuffer, Event::BufferFetched { records }) => {
                (Self::Live, vec![Action::MergeHistory { records }])
            }
            (status, Event::BufferFetched { records }) => {
                (status, vec![Action::MergeHistory { records }])
            }

            // Fetch failures are reported, the stream stays authoritative
            (status, Event::BufferFetchFailed { error }) => {
                (status, vec![Action::ReportFetchFailure { error }])
            }

            // Late open event after the status already moved on
            (status, Event::StreamOpened) => (status, vec![]),
        }
    }

    /// Check if this subscription instance will not change status again
    /// without a dependency change.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NoPermission | Self::Closed | Self::Error)
    }

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoPermission => "no-permission",
            Self::Loading => "loading",
            Self::Buffered => "buffered",
            Self::Live => "live",
            Self::LiveNoBuffer => "live-no-buffer",
            Self::Closed => "closed",
            Self::Error => "error",
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Events that can occur in the subscription lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Target, identity, readiness or endpoint changed.
    ContextChanged,
    /// The access gate refused the current principal.
    PermissionDenied,
    /// Context is ready and the access gate permits.
    Activated,
    /// The live stream finished its handshake.
    StreamOpened,
    /// A normalized record arrived over the live stream.
    MessageReceived {
        /// The record.
        record: LogRecord,
    },
    /// The live stream closed.
    StreamClosed {
        /// Close code reported by the transport.
        code: CloseCode,
    },
    /// The historical fetch resolved.
    BufferFetched {
        /// Records returned by the fetch.
        records: Vec<LogRecord>,
    },
    /// The historical fetch failed.
    BufferFetchFailed {
        /// Error message describing the failure.
        error: String,
    },
}

/// Actions to be executed by livelog-client.
///
/// These are instructions, not side effects. The client interprets these
/// and performs the actual I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Open the live stream for the current target.
    OpenStream,
    /// Close the live stream if one is open.
    CloseStream,
    /// Issue the one-shot historical fetch.
    FetchBuffer,
    /// Discard the current log.
    ResetLog,
    /// Append records from the live stream.
    MergeRecords {
        /// Records to merge.
        records: Vec<LogRecord>,
    },
    /// Merge the historical batch ahead of live records.
    MergeHistory {
        /// Records to merge.
        records: Vec<LogRecord>,
    },
    /// Hand a fetch failure to the diagnostics sink.
    ReportFetchFailure {
        /// Error message describing the failure.
        error: String,
    },
}
