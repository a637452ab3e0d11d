//! Client errors.

use thiserror::Error;

use crate::transport::TransportError;

/// Client errors.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// HTTP request failed before a response was read.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("unexpected status {status} from {path}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Request path (query string omitted).
        path: String,
    },

    /// Endpoint parameters did not form a valid URL.
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_display() {
        let err = ClientError::Status {
            status: 403,
            path: "/api/v1/instance/abc/console/buffer".into(),
        };
        assert_eq!(
            err.to_string(),
            "unexpected status 403 from /api/v1/instance/abc/console/buffer"
        );
    }

    #[test]
    fn transport_error_converts() {
        let err: ClientError = TransportError::ConnectionClosed.into();
        assert!(matches!(err, ClientError::Transport(_)));
    }
}
