//! WebSocketConnector - console stream over WebSocket.
//!
//! Text frames carry one JSON event each. Binary frames holding valid UTF-8
//! are treated as text; ping and pong are answered by the library and never
//! surface.

use super::{Frame, StreamConnection, StreamConnector, TransportError};
use async_trait::async_trait;
use futures_util::StreamExt;
use livelog_types::CloseCode;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Opens WebSocket connections (`ws://` or `wss://`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketConnector;

impl WebSocketConnector {
    /// Create a new connector.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl StreamConnector for WebSocketConnector {
    type Connection = WebSocketConnection;

    async fn connect(&self, url: &str) -> Result<WebSocketConnection, TransportError> {
        // The URL carries the token; keep it out of error messages.
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;
        tracing::debug!("console stream handshake complete");
        Ok(WebSocketConnection { stream })
    }
}

/// An open WebSocket console stream.
pub struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl StreamConnection for WebSocketConnection {
    async fn recv(&mut self) -> Option<Result<Frame, TransportError>> {
        loop {
            let message = match self.stream.next().await? {
                Ok(message) => message,
                Err(e) => return Some(Err(TransportError::ReceiveFailed(e.to_string()))),
            };

            match message {
                Message::Text(text) => return Some(Ok(Frame::Text(text))),
                Message::Binary(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => return Some(Ok(Frame::Text(text))),
                    Err(_) => {
                        tracing::warn!("dropping non-UTF-8 binary frame");
                    }
                },
                Message::Close(frame) => {
                    let code = frame
                        .map(|f| CloseCode::new(u16::from(f.code)))
                        .unwrap_or(CloseCode::NO_STATUS);
                    return Some(Ok(Frame::Close(code)));
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| TransportError::SendFailed(e.to_string()))
    }
}
