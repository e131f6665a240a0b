//! WebSocket transport built on `tokio-tungstenite`.
//!
//! [`WebSocketTransport`] serves both ends of a connection: clients dial with
//! [`connect`](WebSocketTransport::connect) (`ws://` or `wss://`), the server
//! upgrades accepted sockets with [`accept`](WebSocketTransport::accept).
//!
//! ```rust,no_run
//! # async fn example() -> Result<(), fading_tictactoe::GameError> {
//! use fading_tictactoe::{Transport, WebSocketTransport};
//!
//! let mut transport = WebSocketTransport::connect("ws://localhost:3001").await?;
//! transport
//!     .send(r#"{"requestId":1,"command":{"type":"createRoom"}}"#.to_string())
//!     .await?;
//! if let Some(Ok(frame)) = transport.recv().await {
//!     println!("server said: {frame}");
//! }
//! transport.close().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::GameError;
use crate::transport::Transport;

/// A [`Transport`] over a WebSocket stream.
///
/// `S` is the underlying byte stream: [`MaybeTlsStream`] for client
/// connections, a plain [`TcpStream`] for connections the server accepted.
///
/// [`recv`](Transport::recv) is cancel-safe.
#[derive(Debug)]
pub struct WebSocketTransport<S = MaybeTlsStream<TcpStream>> {
    stream: WebSocketStream<S>,
    closed: bool,
}

fn handshake_error(e: tokio_tungstenite::tungstenite::Error) -> GameError {
    let kind = match &e {
        tokio_tungstenite::tungstenite::Error::Io(io) => io.kind(),
        _ => std::io::ErrorKind::Other,
    };
    GameError::Io(std::io::Error::new(kind, e))
}

impl WebSocketTransport {
    /// Dial a game server.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Io`] if the URL is invalid or the handshake fails.
    /// An underlying I/O error keeps its [`ErrorKind`](std::io::ErrorKind).
    pub async fn connect(url: &str) -> Result<Self, GameError> {
        debug!(url = %url, "connecting to game server");
        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(handshake_error)?;
        info!(url = %url, "WebSocket connection established");
        Ok(Self::from_stream(stream))
    }

    /// [`connect`](Self::connect) with a deadline.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Timeout`] if the deadline elapses first.
    pub async fn connect_with_timeout(
        url: &str,
        timeout: std::time::Duration,
    ) -> Result<Self, GameError> {
        tokio::time::timeout(timeout, Self::connect(url))
            .await
            .map_err(|_| GameError::Timeout)?
    }
}

impl WebSocketTransport<TcpStream> {
    /// Run the server side of the WebSocket handshake on an accepted socket.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::Io`] if the peer does not complete the upgrade.
    pub async fn accept(socket: TcpStream) -> Result<Self, GameError> {
        let stream = tokio_tungstenite::accept_async(socket)
            .await
            .map_err(handshake_error)?;
        Ok(Self::from_stream(stream))
    }
}

impl<S> WebSocketTransport<S> {
    /// Wrap an already established WebSocket stream, e.g. one built with
    /// custom TLS or headers.
    pub fn from_stream(stream: WebSocketStream<S>) -> Self {
        Self {
            stream,
            closed: false,
        }
    }
}

#[async_trait]
impl<S> Transport for WebSocketTransport<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn send(&mut self, message: String) -> Result<(), GameError> {
        if self.closed {
            return Err(GameError::TransportClosed);
        }
        self.stream
            .send(Message::Text(message.into()))
            .await
            .map_err(|e| GameError::TransportSend(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<String, GameError>> {
        loop {
            let msg = match self.stream.next().await? {
                Ok(msg) => msg,
                Err(e) => return Some(Err(GameError::TransportReceive(e.to_string()))),
            };

            match msg {
                Message::Text(text) => return Some(Ok(text.to_string())),
                Message::Close(frame) => {
                    debug!(?frame, "received WebSocket close frame");
                    return None;
                }
                // tungstenite queues the pong itself.
                Message::Ping(_) | Message::Pong(_) => {}
                Message::Binary(_) => {
                    warn!("ignoring binary WebSocket frame");
                }
                Message::Frame(_) => {}
            }
        }
    }

    async fn close(&mut self) -> Result<(), GameError> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.stream
            .close(None)
            .await
            .map_err(|e| GameError::TransportSend(e.to_string()))
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    /// Accept one connection on a local port, upgrade it with
    /// [`WebSocketTransport::accept`] and hand it to `handler`.
    async fn start_peer<F, Fut>(handler: F) -> String
    where
        F: FnOnce(WebSocketTransport<TcpStream>) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (tcp, _) = listener.accept().await.unwrap();
            let transport = WebSocketTransport::accept(tcp).await.unwrap();
            handler(transport).await;
        });

        format!("ws://{addr}")
    }

    #[test]
    fn both_ends_are_send() {
        fn assert_send<T: Send>() {}
        assert_send::<WebSocketTransport>();
        assert_send::<WebSocketTransport<TcpStream>>();
    }

    #[tokio::test]
    async fn connect_fails_with_invalid_url() {
        let err = WebSocketTransport::connect("not-a-valid-url")
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Io(_)));
    }

    #[tokio::test]
    async fn connect_fails_with_unreachable_host() {
        let err = WebSocketTransport::connect("ws://127.0.0.1:1")
            .await
            .unwrap_err();
        assert!(matches!(err, GameError::Io(_)));
    }

    #[tokio::test]
    async fn accepted_end_exchanges_frames_with_client() {
        let url = start_peer(|mut server| async move {
            let frame = server.recv().await.unwrap().unwrap();
            server.send(format!("echo:{frame}")).await.unwrap();
            server.close().await.unwrap();
        })
        .await;

        let mut client = WebSocketTransport::connect(&url).await.unwrap();
        client.send("createRoom".to_string()).await.unwrap();

        assert_eq!(client.recv().await.unwrap().unwrap(), "echo:createRoom");
        assert!(client.recv().await.is_none());
    }

    #[tokio::test]
    async fn recv_skips_binary_frames() {
        let url = start_peer(|mut server| async move {
            server
                .stream
                .send(Message::Binary(vec![0xDE, 0xAD].into()))
                .await
                .unwrap();
            server.send("after_binary".to_string()).await.unwrap();
            server.close().await.unwrap();
        })
        .await;

        let mut client = WebSocketTransport::connect(&url).await.unwrap();
        assert_eq!(client.recv().await.unwrap().unwrap(), "after_binary");
    }

    #[tokio::test]
    async fn send_after_close_returns_transport_closed() {
        let url = start_peer(|mut server| async move { while let Some(Ok(_)) = server.recv().await {} })
            .await;

        let mut client = WebSocketTransport::connect(&url).await.unwrap();
        client.close().await.unwrap();
        client.close().await.unwrap();

        let err = client.send("late".to_string()).await.unwrap_err();
        assert!(matches!(err, GameError::TransportClosed));
    }

    #[tokio::test]
    async fn from_stream_wraps_raw_client_stream() {
        let url = start_peer(|mut server| async move {
            server.send("hi".to_string()).await.unwrap();
            server.close().await.unwrap();
        })
        .await;

        let (raw, _) = tokio_tungstenite::connect_async(&url).await.unwrap();
        let mut client = WebSocketTransport::from_stream(raw);
        assert_eq!(client.recv().await.unwrap().unwrap(), "hi");
    }
}
