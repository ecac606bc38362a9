use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::debug;
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

const LOG_TARGET: &str = "seat_trap::realtime::transport";

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to connect to {url}: {reason}")]
    Connect { url: String, reason: String },
    #[error("handshake with {url} timed out after {timeout:?}")]
    HandshakeTimeout { url: String, timeout: Duration },
    #[error("websocket error: {0}")]
    Io(String),
}

/// A connected, text-framed bidirectional link.
#[async_trait::async_trait]
pub trait Transport: Send {
    async fn send(&mut self, text: String) -> Result<(), TransportError>;

    /// `None` once the peer has closed the link.
    async fn recv(&mut self) -> Option<Result<String, TransportError>>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// Opens fresh transports; one per session channel.
#[async_trait::async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError>;
}

#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    url: Url,
    handshake_timeout: Duration,
}

impl WebSocketConnector {
    pub fn new(url: Url, handshake_timeout: Duration) -> Self {
        Self {
            url,
            handshake_timeout,
        }
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait::async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self) -> Result<Box<dyn Transport>, TransportError> {
        let ws_url = self.url.to_string();
        let (stream, _) = timeout(self.handshake_timeout, connect_async(ws_url.as_str()))
            .await
            .map_err(|_| TransportError::HandshakeTimeout {
                url: ws_url.clone(),
                timeout: self.handshake_timeout,
            })?
            .map_err(|err| TransportError::Connect {
                url: ws_url.clone(),
                reason: err.to_string(),
            })?;
        debug!(target: LOG_TARGET, url = %ws_url, "websocket connected");
        Ok(Box::new(WebSocketTransport { stream }))
    }
}

pub struct WebSocketTransport {
    stream: WsStream,
}

#[async_trait::async_trait]
impl Transport for WebSocketTransport {
    async fn send(&mut self, text: String) -> Result<(), TransportError> {
        self.stream
            .send(Message::Text(text))
            .await
            .map_err(|err| TransportError::Io(err.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, TransportError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text)),
                Ok(Message::Ping(payload)) => {
                    if let Err(err) = self.stream.send(Message::Pong(payload)).await {
                        return Some(Err(TransportError::Io(err.to_string())));
                    }
                }
                Ok(Message::Close(frame)) => {
                    debug!(target: LOG_TARGET, ?frame, "socket closed by server");
                    return None;
                }
                Ok(_) => {}
                Err(err) => return Some(Err(TransportError::Io(err.to_string()))),
            }
        }
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.stream
            .close(None)
            .await
            .map_err(|err| TransportError::Io(err.to_string()))
    }
}
