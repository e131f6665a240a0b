//! Per-connection pump between a [`Transport`] and the [`GameServer`].
//!
//! [`GameServer`]: crate::server::GameServer

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::error::Result;
use crate::error_codes::ErrorCode;
use crate::protocol::{ClientRequest, ServerMessage};
use crate::room::ConnectionId;
use crate::server::ServerHandle;
use crate::transport::Transport;

/// Register `transport` with the server and shuttle frames both ways until
/// either side goes away.
///
/// Inbound frames are parsed as [`ClientRequest`]s; a frame that does not
/// parse is answered with an `error` message and the connection stays open.
/// The server is told about the departure exactly once, then the transport is
/// closed.
///
/// # Errors
///
/// Returns the transport or serialization error that ended the connection, or
/// [`GameError::ServerUnavailable`](crate::GameError::ServerUnavailable) if
/// the server stopped. A clean close by either side is `Ok(())`.
pub async fn serve_connection(mut transport: impl Transport, server: ServerHandle) -> Result<()> {
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel();
    let conn = server.connect(outbound_tx).await?;

    let result = pump(&mut transport, conn, &server, &mut outbound_rx).await;
    match &result {
        Ok(()) => debug!(conn = %conn, "connection finished"),
        Err(e) => error!(conn = %conn, error = %e, "connection failed"),
    }

    if server.disconnect(conn).is_err() {
        debug!(conn = %conn, "server already stopped");
    }
    let _ = transport.close().await;
    result
}

async fn pump(
    transport: &mut impl Transport,
    conn: ConnectionId,
    server: &ServerHandle,
    outbound_rx: &mut mpsc::UnboundedReceiver<ServerMessage>,
) -> Result<()> {
    loop {
        tokio::select! {
            outbound = outbound_rx.recv() => {
                let Some(message) = outbound else {
                    info!(conn = %conn, "session dropped by server");
                    return Ok(());
                };
                let json = serde_json::to_string(&message)?;
                transport.send(json).await?;
            }

            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => match serde_json::from_str::<ClientRequest>(&text) {
                        Ok(request) => server.request(conn, request)?,
                        Err(e) => {
                            warn!(conn = %conn, error = %e, "malformed request");
                            let reply = ServerMessage::Error {
                                message: format!("malformed request: {e}"),
                                error_code: Some(ErrorCode::InvalidInput),
                            };
                            transport.send(serde_json::to_string(&reply)?).await?;
                        }
                    },
                    Some(Err(e)) => return Err(e),
                    None => {
                        debug!(conn = %conn, "peer closed the connection");
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::config::ServerConfig;
    use crate::server::GameServer;
    use crate::transports::LocalTransport;

    async fn next_json(peer: &mut LocalTransport) -> serde_json::Value {
        let text = peer.recv().await.unwrap().unwrap();
        serde_json::from_str(&text).unwrap()
    }

    #[tokio::test]
    async fn welcome_then_ack() {
        let handle = GameServer::spawn(&ServerConfig::default());
        let (server_end, mut peer) = LocalTransport::pair();
        tokio::spawn(serve_connection(server_end, handle));

        let welcome = next_json(&mut peer).await;
        assert_eq!(welcome["type"], "welcome");

        peer.send(r#"{"requestId":5,"command":{"type":"createRoom"}}"#.into())
            .await
            .unwrap();
        let ack = next_json(&mut peer).await;
        assert_eq!(ack["type"], "ack");
        assert_eq!(ack["data"]["requestId"], 5);
        assert_eq!(ack["data"]["response"]["symbol"], "O");
    }

    #[tokio::test]
    async fn malformed_frame_gets_error_and_connection_survives() {
        let handle = GameServer::spawn(&ServerConfig::default());
        let (server_end, mut peer) = LocalTransport::pair();
        tokio::spawn(serve_connection(server_end, handle));
        next_json(&mut peer).await;

        peer.send("not json".into()).await.unwrap();
        let err = next_json(&mut peer).await;
        assert_eq!(err["type"], "error");
        assert_eq!(err["data"]["errorCode"], "INVALID_INPUT");

        peer.send(r#"{"requestId":1,"command":{"type":"createRoom"}}"#.into())
            .await
            .unwrap();
        assert_eq!(next_json(&mut peer).await["type"], "ack");
    }

    #[tokio::test]
    async fn peer_close_retires_its_room() {
        let handle = GameServer::spawn(&ServerConfig::default());
        let (server_end, mut peer) = LocalTransport::pair();
        let task = tokio::spawn(serve_connection(server_end, handle.clone()));
        next_json(&mut peer).await;

        peer.send(r#"{"requestId":1,"command":{"type":"createRoom"}}"#.into())
            .await
            .unwrap();
        next_json(&mut peer).await;
        assert_eq!(handle.room_count().await.unwrap(), 1);

        peer.close().await.unwrap();
        task.await.unwrap().unwrap();
        assert_eq!(handle.room_count().await.unwrap(), 0);
    }
}
