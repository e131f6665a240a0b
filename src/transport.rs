//! Transport abstraction shared by the game server and the client SDK.
//!
//! A [`Transport`] is a bidirectional channel of JSON text frames. The server
//! pumps one transport per connection (see [`serve_connection`]); the client
//! hands one to [`GameClient::start`]. Framing is the transport's business:
//! WebSocket frames for [`WebSocketTransport`], plain channel items for
//! [`LocalTransport`].
//!
//! Connection setup is not part of the trait. Build a connected transport
//! first, then give it to the side that drives it.
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use fading_tictactoe::error::GameError;
//! use fading_tictactoe::transport::Transport;
//! use tokio::sync::mpsc;
//!
//! struct Lines {
//!     tx: mpsc::UnboundedSender<String>,
//!     rx: mpsc::UnboundedReceiver<String>,
//! }
//!
//! #[async_trait]
//! impl Transport for Lines {
//!     async fn send(&mut self, message: String) -> Result<(), GameError> {
//!         self.tx
//!             .send(message)
//!             .map_err(|e| GameError::TransportSend(e.to_string()))
//!     }
//!
//!     async fn recv(&mut self) -> Option<Result<String, GameError>> {
//!         self.rx.recv().await.map(Ok)
//!     }
//!
//!     async fn close(&mut self) -> Result<(), GameError> {
//!         self.rx.close();
//!         Ok(())
//!     }
//! }
//! ```
//!
//! [`serve_connection`]: crate::connection::serve_connection
//! [`GameClient::start`]: crate::client::GameClient::start
//! [`WebSocketTransport`]: crate::transports::WebSocketTransport
//! [`LocalTransport`]: crate::transports::LocalTransport

use async_trait::async_trait;

use crate::error::GameError;

/// A bidirectional text frame transport.
///
/// Each [`send`](Transport::send) writes one complete JSON frame and each
/// [`recv`](Transport::recv) yields one.
///
/// The trait is object-safe, so `Box<dyn Transport>` works where the concrete
/// type is not known up front.
///
/// # Cancel Safety
///
/// [`recv`](Transport::recv) runs inside `tokio::select!` on both the server
/// and the client, so it **MUST** be cancel-safe: dropping an unfinished
/// `recv` future must not lose a frame.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Send one JSON text frame to the peer.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::TransportSend`] if the frame could not be written,
    /// or [`GameError::TransportClosed`] after [`close`](Transport::close).
    async fn send(&mut self, message: String) -> Result<(), GameError>;

    /// Receive the next JSON text frame from the peer.
    ///
    /// - `Some(Ok(text))`: a complete frame
    /// - `Some(Err(e))`: the transport failed
    /// - `None`: the peer closed the connection cleanly
    async fn recv(&mut self) -> Option<Result<String, GameError>>;

    /// Close the connection gracefully. Calling it twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the close handshake fails; resources are released
    /// regardless.
    async fn close(&mut self) -> Result<(), GameError>;
}
