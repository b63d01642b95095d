//! WebSocket handler
//!
//! Bridges one WebSocket to the presence coordinator: inbound frames become
//! presence events, outbound events are drained from the per-connection
//! channel. The socket closes when that channel closes, which is how the
//! coordinator terminates a rejected connection.

use crate::protocol::ClientMessage;
use crate::server::GatewayState;
use axum::{
    extract::{ws::Message, State, WebSocketUpgrade},
    response::IntoResponse,
};
use chatd_core::{ConnectionId, Credentials, RoomName};
use chatd_presence::PresenceHandle;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(state, socket))
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(state: GatewayState, socket: axum::extract::ws::WebSocket) {
    let connection_id = ConnectionId::generate();

    // The coordinator holds the only other clone of this sender; when it
    // removes the connection, `rx` closes and the send task ends.
    let (tx, mut rx) = mpsc::channel(state.config().presence.outbound_buffer);
    state.presence().connect(connection_id.clone(), tx);

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    let (mut ws_sink, mut ws_stream) = socket.split();

    let presence_recv = state.presence().clone();
    let connection_recv = connection_id.clone();

    let recv_task = tokio::spawn(async move {
        while let Some(msg) = ws_stream.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    handle_text_frame(&presence_recv, &connection_recv, &text);
                }
                Ok(Message::Binary(_)) => {
                    tracing::debug!(
                        connection_id = %connection_recv,
                        "Binary frames not supported; ignored"
                    );
                }
                Ok(Message::Ping(_) | Message::Pong(_)) => {
                    // Pong is handled automatically by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::info!(connection_id = %connection_recv, "Client closed connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!(
                        connection_id = %connection_recv,
                        error = %e,
                        "WebSocket error"
                    );
                    break;
                }
            }
        }
    });

    let connection_send = connection_id.clone();

    let send_task = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    if ws_sink.send(Message::Text(json.into())).await.is_err() {
                        tracing::warn!(
                            connection_id = %connection_send,
                            "Failed to send event to WebSocket"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        connection_id = %connection_send,
                        error = %e,
                        "Event serialization failed"
                    );
                }
            }
        }

        // Close the WebSocket when the outbound channel closes
        let _ = ws_sink.close().await;
    });

    tokio::select! {
        _ = recv_task => {
            tracing::debug!(connection_id = %connection_id, "Receive task ended");
        }
        _ = send_task => {
            tracing::debug!(connection_id = %connection_id, "Send task ended");
        }
    }

    state.presence().disconnect(connection_id);
}

/// Translate a text frame into a presence event
///
/// Unparseable frames are logged and dropped; the connection stays open.
fn handle_text_frame(presence: &PresenceHandle, connection: &ConnectionId, text: &str) {
    let message = match ClientMessage::from_json(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(
                connection_id = %connection,
                error = %e,
                "Unparseable frame ignored"
            );
            return;
        }
    };

    match message {
        ClientMessage::Handshake { token } => {
            presence.handshake(connection.clone(), Credentials::new(token));
        }
        ClientMessage::JoinRoom { room } => {
            presence.join_room(connection.clone(), RoomName::from(room));
        }
        ClientMessage::Typing => presence.typing(connection.clone()),
        ClientMessage::StopTyping => presence.stop_typing(connection.clone()),
        ClientMessage::Message { content } => {
            presence.chat_message(connection.clone(), content);
        }
    }
}
