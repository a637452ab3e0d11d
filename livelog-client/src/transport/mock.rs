//! Mock stream transport for testing.
//!
//! Every `connect()` hands a [`MockRemote`] to the test, which decides
//! whether the connection is accepted and what the server sends.

use super::{Frame, StreamConnection, StreamConnector, TransportError};
use async_trait::async_trait;
use livelog_types::{ClientEvent, CloseCode};
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, watch};

type FrameResult = Result<Frame, TransportError>;

/// Mock connector for testing.
///
/// Clones share state, so a test can keep one clone while the subscription
/// owns another.
#[derive(Debug, Clone)]
pub struct MockConnector {
    inner: Arc<Mutex<MockConnectorInner>>,
    remotes_tx: mpsc::UnboundedSender<MockRemote>,
    remotes_rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<MockRemote>>>,
}

#[derive(Debug, Default)]
struct MockConnectorInner {
    connected_urls: Vec<String>,
    fail_next_connect: Option<String>,
}

impl MockConnector {
    /// Create a new mock connector.
    pub fn new() -> Self {
        let (remotes_tx, remotes_rx) = mpsc::unbounded_channel();
        Self {
            inner: Arc::new(Mutex::new(MockConnectorInner::default())),
            remotes_tx,
            remotes_rx: Arc::new(tokio::sync::Mutex::new(remotes_rx)),
        }
    }

    /// Wait for the next connection attempt.
    pub async fn next_remote(&self) -> Option<MockRemote> {
        self.remotes_rx.lock().await.recv().await
    }

    /// Cause the next connect() to fail immediately with the given error.
    pub fn fail_next_connect(&self, error: &str) {
        let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.fail_next_connect = Some(error.to_string());
    }

    /// Number of connection attempts so far.
    pub fn connection_count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.connected_urls.len()
    }

    /// URLs of all connection attempts, oldest first.
    pub fn connected_urls(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        inner.connected_urls.clone()
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamConnector for MockConnector {
    type Connection = MockConnection;

    async fn connect(&self, url: &str) -> Result<MockConnection, TransportError> {
        {
            let mut inner = self.inner.lock().unwrap_or_else(|e| e.into_inner());
            inner.connected_urls.push(url.to_string());

            // Check for forced failure
            if let Some(error) = inner.fail_next_connect.take() {
                return Err(TransportError::ConnectionFailed(error));
            }
        }

        let (frames_tx, frames_rx) = mpsc::unbounded_channel();
        let (accept_tx, accept_rx) = oneshot::channel();
        let (closed_tx, closed_rx) = watch::channel(false);

        let remote = MockRemote {
            url: url.to_string(),
            accept: Some(accept_tx),
            frames: frames_tx,
            closed: closed_rx,
        };
        self.remotes_tx
            .send(remote)
            .map_err(|_| TransportError::ConnectionFailed("mock connector gone".into()))?;

        match accept_rx.await {
            Ok(Ok(())) => Ok(MockConnection {
                frames: frames_rx,
                closed: closed_tx,
            }),
            Ok(Err(reason)) => Err(TransportError::ConnectionFailed(reason)),
            Err(_) => Err(TransportError::ConnectionFailed(
                "remote dropped before accepting".into(),
            )),
        }
    }
}

/// Server side of one mock connection.
///
/// Dropping the remote ends the stream without a close frame.
#[derive(Debug)]
pub struct MockRemote {
    url: String,
    accept: Option<oneshot::Sender<Result<(), String>>>,
    frames: mpsc::UnboundedSender<FrameResult>,
    closed: watch::Receiver<bool>,
}

impl MockRemote {
    /// URL the client connected to.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Accept the pending connection.
    pub fn accept(&mut self) {
        if let Some(tx) = self.accept.take() {
            let _ = tx.send(Ok(()));
        }
    }

    /// Refuse the pending connection.
    pub fn reject(&mut self, reason: &str) {
        if let Some(tx) = self.accept.take() {
            let _ = tx.send(Err(reason.to_string()));
        }
    }

    /// Send a raw text frame. Returns false if the client is gone.
    pub fn send_text(&self, text: &str) -> bool {
        self.frames.send(Ok(Frame::Text(text.to_string()))).is_ok()
    }

    /// Send an event as a JSON text frame.
    pub fn send_event(&self, event: &ClientEvent) -> bool {
        match event.to_json() {
            Ok(text) => self.send_text(&text),
            Err(_) => false,
        }
    }

    /// Send a close frame.
    pub fn close(&self, code: CloseCode) -> bool {
        self.frames.send(Ok(Frame::Close(code))).is_ok()
    }

    /// Make the client's next receive fail.
    pub fn fail(&self, reason: &str) -> bool {
        self.frames
            .send(Err(TransportError::ReceiveFailed(reason.to_string())))
            .is_ok()
    }

    /// Whether the client has closed or dropped its end.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    /// Wait until the client closes or drops its end.
    pub async fn wait_closed(&mut self) -> bool {
        self.closed.wait_for(|closed| *closed).await.is_ok()
    }
}

/// Client side of one mock connection.
#[derive(Debug)]
pub struct MockConnection {
    frames: mpsc::UnboundedReceiver<FrameResult>,
    closed: watch::Sender<bool>,
}

#[async_trait]
impl StreamConnection for MockConnection {
    async fn recv(&mut self) -> Option<FrameResult> {
        self.frames.recv().await
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.closed.send_replace(true);
        Ok(())
    }
}

impl Drop for MockConnection {
    fn drop(&mut self) {
        self.closed.send_replace(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn connected(connector: &MockConnector, url: &str) -> (MockConnection, MockRemote) {
        let connecting = {
            let connector = connector.clone();
            let url = url.to_string();
            tokio::spawn(async move { connector.connect(&url).await })
        };
        let mut remote = connector.next_remote().await.unwrap();
        remote.accept();
        let connection = connecting.await.unwrap().unwrap();
        (connection, remote)
    }

    #[tokio::test]
    async fn accepted_connection_receives_frames() {
        let connector = MockConnector::new();
        let (mut connection, remote) = connected(&connector, "ws://core/a").await;

        assert_eq!(remote.url(), "ws://core/a");
        assert!(remote.send_text("hello"));
        assert!(remote.close(CloseCode::NORMAL));

        assert_eq!(
            connection.recv().await.unwrap().unwrap(),
            Frame::Text("hello".into())
        );
        assert_eq!(
            connection.recv().await.unwrap().unwrap(),
            Frame::Close(CloseCode::NORMAL)
        );
    }

    #[tokio::test]
    async fn rejected_connection_fails() {
        let connector = MockConnector::new();
        let connecting = {
            let connector = connector.clone();
            tokio::spawn(async move { connector.connect("ws://core/a").await })
        };

        let mut remote = connector.next_remote().await.unwrap();
        remote.reject("forbidden");

        let result = connecting.await.unwrap();
        assert!(matches!(result, Err(TransportError::ConnectionFailed(r)) if r == "forbidden"));
    }

    #[tokio::test]
    async fn forced_connect_failure() {
        let connector = MockConnector::new();
        connector.fail_next_connect("network unreachable");

        let result = connector.connect("ws://core/a").await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
        assert_eq!(connector.connection_count(), 1);
    }

    #[tokio::test]
    async fn dropped_remote_ends_stream() {
        let connector = MockConnector::new();
        let (mut connection, remote) = connected(&connector, "ws://core/a").await;

        drop(remote);
        assert!(connection.recv().await.is_none());
    }

    #[tokio::test]
    async fn remote_failure_surfaces_as_error() {
        let connector = MockConnector::new();
        let (mut connection, remote) = connected(&connector, "ws://core/a").await;

        remote.fail("reset by peer");
        assert!(matches!(
            connection.recv().await,
            Some(Err(TransportError::ReceiveFailed(_)))
        ));
    }

    #[tokio::test]
    async fn close_and_drop_are_observed() {
        let connector = MockConnector::new();
        let (mut connection, mut remote) = connected(&connector, "ws://core/a").await;
        assert!(!remote.is_closed());

        connection.close().await.unwrap();
        assert!(remote.wait_closed().await);

        let (connection, mut remote) = connected(&connector, "ws://core/b").await;
        drop(connection);
        assert!(remote.wait_closed().await);
        assert!(!remote.send_text("late"));
    }

    #[tokio::test]
    async fn clone_shares_state() {
        let connector = MockConnector::new();
        let other = connector.clone();
        let _pair = connected(&other, "ws://core/a").await;

        assert_eq!(connector.connected_urls(), vec!["ws://core/a".to_string()]);
    }
}
