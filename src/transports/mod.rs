//! Concrete [`Transport`](crate::Transport) implementations.
//!
//! | Feature                | Transport              |
//! |------------------------|------------------------|
//! | (always)               | [`LocalTransport`]     |
//! | `transport-websocket`  | [`WebSocketTransport`] |
//!
//! [`LocalTransport`] connects a client and the server inside one process,
//! which is how the demos and most integration tests run a full match.

pub mod local;

#[cfg(feature = "transport-websocket")]
pub mod websocket;

pub use local::LocalTransport;

#[cfg(feature = "transport-websocket")]
pub use websocket::WebSocketTransport;
