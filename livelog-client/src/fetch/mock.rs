//! Mock buffer fetcher for testing.
//!
//! Each `fetch_buffer()` call parks until the test answers the matching
//! [`PendingFetch`], so tests control exactly when history arrives relative
//! to the live stream.

use super::{BufferFetcher, FetchRequest};
use crate::error::ClientError;
use crate::transport::TransportError;
use async_trait::async_trait;
use livelog_types::LogRecord;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot};

type Reply = Result<Vec<LogRecord>, ClientError>;

/// Mock fetcher for testing. Clones share state.
#[derive(Debug, Clone)]
pub struct MockFetcher {
    requests: Arc<Mutex<Vec<FetchRequest>>>,
    pending_tx: mpsc::UnboundedSender<PendingFetch>,
    pending_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<PendingFetch>>>,
}

impl MockFetcher {
    /// Create a new mock fetcher.
    pub fn new() -> Self {
        let (pending_tx, pending_rx) = mpsc::unbounded_channel();
        Self {
            requests: Arc::new(Mutex::new(Vec::new())),
            pending_tx,
            pending_rx: Arc::new(tokio::sync::Mutex::new(pending_rx)),
        }
    }

    /// Wait for the next buffer request.
    pub async fn next_request(&self) -> Option<PendingFetch> {
        self.pending_rx.lock().await.recv().await
    }

    /// Number of requests made so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// All requests made so far, oldest first.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BufferFetcher for MockFetcher {
    async fn fetch_buffer(&self, request: &FetchRequest) -> Reply {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.clone());

        let (reply_tx, reply_rx) = oneshot::channel();
        let pending = PendingFetch {
            request: request.clone(),
            reply: reply_tx,
        };
        if self.pending_tx.send(pending).is_err() {
            return Err(TransportError::ConnectionClosed.into());
        }

        reply_rx
            .await
            .unwrap_or_else(|_| Err(TransportError::ConnectionClosed.into()))
    }
}

/// A buffer request waiting for the test to answer it.
///
/// Dropping it fails the request.
#[derive(Debug)]
pub struct PendingFetch {
    /// The request as issued.
    pub request: FetchRequest,
    reply: oneshot::Sender<Reply>,
}

impl PendingFetch {
    /// Answer with these records.
    pub fn respond(self, records: Vec<LogRecord>) {
        let _ = self.reply.send(Ok(records));
    }

    /// Answer with an error.
    pub fn fail(self, error: ClientError) {
        let _ = self.reply.send(Err(error));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use livelog_types::InstanceUuid;

    fn request() -> FetchRequest {
        FetchRequest {
            url: "http://core/api/v1/instance/abc/console/buffer".into(),
            token: "t".into(),
            target: InstanceUuid::from("abc"),
        }
    }

    #[tokio::test]
    async fn respond_delivers_records() {
        let fetcher = MockFetcher::new();
        let call = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.fetch_buffer(&request()).await })
        };

        let pending = fetcher.next_request().await.unwrap();
        assert_eq!(pending.request.target.as_str(), "abc");
        pending.respond(vec![LogRecord::new("k1", 1, "abc", "alpha", "one")]);

        let records = call.await.unwrap().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(fetcher.request_count(), 1);
    }

    #[tokio::test]
    async fn fail_and_drop_are_errors() {
        let fetcher = MockFetcher::new();

        let call = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.fetch_buffer(&request()).await })
        };
        fetcher.next_request().await.unwrap().fail(ClientError::Status {
            status: 500,
            path: "/x".into(),
        });
        assert!(matches!(
            call.await.unwrap(),
            Err(ClientError::Status { status: 500, .. })
        ));

        let call = {
            let fetcher = fetcher.clone();
            tokio::spawn(async move { fetcher.fetch_buffer(&request()).await })
        };
        drop(fetcher.next_request().await.unwrap());
        assert!(matches!(call.await.unwrap(), Err(ClientError::Transport(_))));
        assert_eq!(fetcher.requests().len(), 2);
    }
}
