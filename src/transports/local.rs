//! In-process transport backed by a pair of unbounded channels.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::GameError;
use crate::transport::Transport;

/// One end of an in-process connection.
///
/// Frames sent on one end arrive on the other in order. Dropping or closing
/// an end makes the peer's [`recv`](Transport::recv) return `None`.
#[derive(Debug)]
pub struct LocalTransport {
    tx: Option<mpsc::UnboundedSender<String>>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl LocalTransport {
    /// Two connected ends: hand one to the server, the other to a client.
    pub fn pair() -> (Self, Self) {
        let (a_tx, b_rx) = mpsc::unbounded_channel();
        let (b_tx, a_rx) = mpsc::unbounded_channel();
        (
            Self {
                tx: Some(a_tx),
                rx: a_rx,
            },
            Self {
                tx: Some(b_tx),
                rx: b_rx,
            },
        )
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn send(&mut self, message: String) -> Result<(), GameError> {
        let tx = self.tx.as_ref().ok_or(GameError::TransportClosed)?;
        tx.send(message)
            .map_err(|_| GameError::TransportSend("peer dropped".into()))
    }

    // `UnboundedReceiver::recv` is cancel-safe.
    async fn recv(&mut self) -> Option<Result<String, GameError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), GameError> {
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn frames_arrive_in_order() {
        let (mut a, mut b) = LocalTransport::pair();
        a.send("one".into()).await.unwrap();
        a.send("two".into()).await.unwrap();

        assert_eq!(b.recv().await.unwrap().unwrap(), "one");
        assert_eq!(b.recv().await.unwrap().unwrap(), "two");
    }

    #[tokio::test]
    async fn close_ends_the_peer_stream() {
        let (mut a, mut b) = LocalTransport::pair();
        a.close().await.unwrap();
        assert!(b.recv().await.is_none());

        let err = a.send("late".into()).await.unwrap_err();
        assert!(matches!(err, GameError::TransportClosed));
        a.close().await.unwrap();
    }

    #[tokio::test]
    async fn send_to_dropped_peer_fails() {
        let (mut a, b) = LocalTransport::pair();
        drop(b);
        let err = a.send("hello".into()).await.unwrap_err();
        assert!(matches!(err, GameError::TransportSend(_)));
    }
}
