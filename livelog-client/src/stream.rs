//! Per-activation stream pump.
//!
//! Each activation of a subscription spawns one pump task that owns the
//! stream connection and forwards what it sees to the subscription driver,
//! tagged with the activation's generation.

use std::sync::Arc;

use livelog_types::{CloseCode, LogRecord};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::ClientError;
use crate::transport::{Frame, StreamConnection, StreamConnector};

/// Something that happened on behalf of one activation.
#[derive(Debug)]
pub(crate) enum Input {
    /// The stream connection was accepted.
    Opened,
    /// A text frame arrived.
    Frame(String),
    /// The stream ended with this code.
    Closed(CloseCode),
    /// The buffer request completed.
    Fetched(Result<Vec<LogRecord>, ClientError>),
}

/// An [`Input`] stamped with the generation that produced it.
#[derive(Debug)]
pub(crate) struct Tagged {
    pub generation: u64,
    pub input: Input,
}

/// Handle to a running pump. Dropping it closes the stream.
pub(crate) struct StreamHandle {
    close_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl StreamHandle {
    /// Spawn a pump that connects to `url`.
    ///
    /// When `previous` is given, the new pump waits for it to finish closing
    /// before it connects, so at most one connection is open at a time.
    pub(crate) fn spawn<C: StreamConnector>(
        connector: Arc<C>,
        url: String,
        generation: u64,
        inputs: mpsc::UnboundedSender<Tagged>,
        previous: Option<StreamHandle>,
    ) -> Self {
        let (close_tx, close_rx) = oneshot::channel();
        let task = tokio::spawn(async move {
            if let Some(previous) = previous {
                previous.shutdown().await;
            }
            pump(connector, url, generation, inputs, close_rx).await;
        });
        Self {
            close_tx: Some(close_tx),
            task,
        }
    }

    /// Ask the pump to close its connection.
    pub(crate) fn close(&mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
    }

    /// Close and wait for the pump to finish.
    pub(crate) async fn shutdown(mut self) {
        self.close();
        let _ = (&mut self.task).await;
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.close();
    }
}

async fn pump<C: StreamConnector>(
    connector: Arc<C>,
    url: String,
    generation: u64,
    inputs: mpsc::UnboundedSender<Tagged>,
    mut close_rx: oneshot::Receiver<()>,
) {
    let send = |input: Input| inputs.send(Tagged { generation, input }).is_ok();

    let mut connection = tokio::select! {
        result = connector.connect(&url) => match result {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!(generation, error = %e, "console stream connect failed");
                send(Input::Closed(CloseCode::ABNORMAL));
                return;
            }
        },
        _ = &mut close_rx => return,
    };

    if !send(Input::Opened) {
        let _ = connection.close().await;
        return;
    }

    loop {
        tokio::select! {
            frame = connection.recv() => match frame {
                Some(Ok(Frame::Text(text))) => {
                    if !send(Input::Frame(text)) {
                        let _ = connection.close().await;
                        return;
                    }
                }
                Some(Ok(Frame::Close(code))) => {
                    tracing::debug!(generation, code = code.value(), "console stream closed by server");
                    send(Input::Closed(code));
                    return;
                }
                Some(Err(e)) => {
                    tracing::warn!(generation, error = %e, "console stream failed");
                    send(Input::Closed(CloseCode::ABNORMAL));
                    return;
                }
                None => {
                    tracing::warn!(generation, "console stream ended without close frame");
                    send(Input::Closed(CloseCode::ABNORMAL));
                    return;
                }
            },
            _ = &mut close_rx => {
                if let Err(e) = connection.close().await {
                    tracing::debug!(generation, error = %e, "console stream close failed");
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::MockConnector;
    use livelog_types::ClientEvent;

    fn setup() -> (
        Arc<MockConnector>,
        mpsc::UnboundedSender<Tagged>,
        mpsc::UnboundedReceiver<Tagged>,
    ) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Arc::new(MockConnector::new()), tx, rx)
    }

    #[tokio::test]
    async fn forwards_open_frames_and_close() {
        let (connector, tx, mut rx) = setup();
        let _handle = StreamHandle::spawn(connector.clone(), "ws://core/s".into(), 3, tx, None);

        let mut remote = connector.next_remote().await.unwrap();
        remote.accept();
        let event = ClientEvent::instance_output("abc", "alpha", "k1", 1, "hello");
        remote.send_event(&event);
        remote.close(CloseCode::NORMAL);

        let opened = rx.recv().await.unwrap();
        assert_eq!(opened.generation, 3);
        assert!(matches!(opened.input, Input::Opened));
        assert!(matches!(rx.recv().await.unwrap().input, Input::Frame(_)));
        assert!(matches!(
            rx.recv().await.unwrap().input,
            Input::Closed(CloseCode::NORMAL)
        ));
    }

    #[tokio::test]
    async fn connect_failure_is_abnormal_close() {
        let (connector, tx, mut rx) = setup();
        connector.fail_next_connect("refused");
        let _handle = StreamHandle::spawn(connector.clone(), "ws://core/s".into(), 1, tx, None);

        assert!(matches!(
            rx.recv().await.unwrap().input,
            Input::Closed(CloseCode::ABNORMAL)
        ));
    }

    #[tokio::test]
    async fn stream_end_is_abnormal_close() {
        let (connector, tx, mut rx) = setup();
        let _handle = StreamHandle::spawn(connector.clone(), "ws://core/s".into(), 1, tx, None);

        let mut remote = connector.next_remote().await.unwrap();
        remote.accept();
        assert!(matches!(rx.recv().await.unwrap().input, Input::Opened));

        drop(remote);
        assert!(matches!(
            rx.recv().await.unwrap().input,
            Input::Closed(CloseCode::ABNORMAL)
        ));
    }

    #[tokio::test]
    async fn dropping_handle_closes_connection() {
        let (connector, tx, mut rx) = setup();
        let handle = StreamHandle::spawn(connector.clone(), "ws://core/s".into(), 1, tx, None);

        let mut remote = connector.next_remote().await.unwrap();
        remote.accept();
        assert!(matches!(rx.recv().await.unwrap().input, Input::Opened));

        drop(handle);
        assert!(remote.wait_closed().await);
    }

    #[tokio::test]
    async fn shutdown_before_accept_abandons_connect() {
        let (connector, tx, mut rx) = setup();
        let handle = StreamHandle::spawn(connector.clone(), "ws://core/s".into(), 1, tx, None);

        let _remote = connector.next_remote().await.unwrap();
        handle.shutdown().await;

        // Pump has exited and dropped its sender.
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn next_pump_connects_after_previous_closed() {
        let (connector, tx, mut rx) = setup();
        let mut first = StreamHandle::spawn(
            connector.clone(),
            "ws://core/a".into(),
            1,
            tx.clone(),
            None,
        );

        let mut first_remote = connector.next_remote().await.unwrap();
        first_remote.accept();
        assert!(matches!(rx.recv().await.unwrap().input, Input::Opened));

        first.close();
        let _second = StreamHandle::spawn(
            connector.clone(),
            "ws://core/b".into(),
            2,
            tx,
            Some(first),
        );

        let second_remote = connector.next_remote().await.unwrap();
        assert_eq!(second_remote.url(), "ws://core/b");
        assert!(first_remote.is_closed());
        assert_eq!(connector.connected_urls(), vec!["ws://core/a", "ws://core/b"]);
    }

    #[tokio::test]
    async fn shutdown_waits_for_previous_pump() {
        let (connector, tx, _rx) = setup();
        let first = StreamHandle::spawn(
            connector.clone(),
            "ws://core/a".into(),
            1,
            tx.clone(),
            None,
        );
        let mut first_remote = connector.next_remote().await.unwrap();
        first_remote.accept();

        let second = StreamHandle::spawn(
            connector.clone(),
            "ws://core/b".into(),
            2,
            tx,
            Some(first),
        );
        second.shutdown().await;

        assert!(first_remote.is_closed());
    }
}
