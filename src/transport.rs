//! Socket seam between the connection task and the network.
//!
//! DESIGN
//! ======
//! The connection task only ever sees text frames, a close (`None`), or an
//! error. [`WsConnector`] backs that with tokio-tungstenite; tests substitute
//! an in-memory implementation so timer behavior can run on paused time.

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::error::PresenceError;

/// Opens sockets. One call per connection attempt.
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    /// Open a socket to `url`.
    ///
    /// # Errors
    ///
    /// [`PresenceError::InvalidUrl`] when the URL itself is unusable, and
    /// [`PresenceError::Unreachable`] for network or handshake failures.
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, PresenceError>;
}

/// An open text-frame socket.
#[async_trait]
pub trait Transport: Send {
    /// Write one text frame.
    ///
    /// # Errors
    ///
    /// Returns [`PresenceError::Socket`] when the write fails.
    async fn send(&mut self, text: String) -> Result<(), PresenceError>;

    /// Next inbound text frame; `None` once the socket has closed.
    ///
    /// Must be cancel-safe: the connection task races it against control
    /// messages. After yielding an error, the next call returns `None`.
    async fn recv(&mut self) -> Option<Result<String, PresenceError>>;

    /// Close the socket. Failures are logged, not returned.
    async fn close(&mut self);
}

/// Production connector over tokio-tungstenite.
#[derive(Clone, Copy, Debug, Default)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, url: &str) -> Result<Box<dyn Transport>, PresenceError> {
        let (stream, response) = connect_async(url).await.map_err(classify_connect_error)?;
        tracing::debug!(%url, status = %response.status(), "websocket handshake complete");
        Ok(Box::new(WsTransport { stream, failed: false }))
    }
}

fn classify_connect_error(error: tungstenite::Error) -> PresenceError {
    match error {
        tungstenite::Error::Url(error) => PresenceError::InvalidUrl(error.to_string()),
        tungstenite::Error::HttpFormat(error) => PresenceError::InvalidUrl(error.to_string()),
        other => PresenceError::Unreachable(other.to_string()),
    }
}

struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    failed: bool,
}

#[async_trait]
impl Transport for WsTransport {
    async fn send(&mut self, text: String) -> Result<(), PresenceError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|error| PresenceError::Socket(error.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, PresenceError>> {
        if self.failed {
            return None;
        }
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(text.as_str().to_owned())),
                Ok(Message::Binary(bytes)) => match std::str::from_utf8(&bytes) {
                    Ok(text) => return Some(Ok(text.to_owned())),
                    Err(error) => tracing::warn!(%error, len = bytes.len(), "dropping non-utf8 binary frame"),
                },
                Ok(Message::Close(frame)) => {
                    tracing::debug!(?frame, "server closed websocket");
                    return None;
                }
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(error) => {
                    self.failed = true;
                    return Some(Err(PresenceError::Socket(error.to_string())));
                }
            }
        }
    }

    async fn close(&mut self) {
        if let Err(error) = self.stream.close(None).await {
            tracing::debug!(%error, "websocket close failed");
        }
    }
}

#[cfg(test)]
#[path = "transport_test.rs"]
mod tests;
