//! WebSocket handler
//!
//! Upgrades connections, runs admission, and pumps frames in both
//! directions until the socket closes.

use crate::connection::Connection;
use crate::lifecycle::AdmissionError;
use crate::protocol::{ClientFrame, EventEnvelope};
use crate::server::GatewayState;
use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket},
        ConnectInfo, Query, State, WebSocketUpgrade,
    },
    http::{header, HeaderMap},
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Channel buffer size for outgoing events
const MESSAGE_BUFFER_SIZE: usize = 100;

/// Query parameters accepted on the upgrade request
#[derive(Debug, Deserialize)]
pub struct TokenQuery {
    token: Option<String>,
}

/// WebSocket gateway handler
pub async fn gateway_handler(
    State(state): State<GatewayState>,
    ConnectInfo(address): ConnectInfo<SocketAddr>,
    Query(query): Query<TokenQuery>,
    headers: HeaderMap,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let token = extract_token(&query, &headers);
    ws.on_upgrade(move |socket| handle_socket(state, socket, address, token))
}

/// Pull the credential from the query string or the Authorization header
///
/// The query parameter wins when both are present.
fn extract_token(query: &TokenQuery, headers: &HeaderMap) -> Option<String> {
    if let Some(token) = &query.token {
        return Some(token.clone());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Handle an upgraded WebSocket connection
async fn handle_socket(
    state: GatewayState,
    socket: WebSocket,
    address: SocketAddr,
    token: Option<String>,
) {
    let (tx, rx) = mpsc::channel::<EventEnvelope>(MESSAGE_BUFFER_SIZE);

    let connection = match state
        .lifecycle()
        .admit(address.ip(), token.as_deref(), tx)
        .await
    {
        Ok(connection) => connection,
        Err(error) => {
            reject(socket, address, &error).await;
            return;
        }
    };

    run_connection(state, socket, connection, rx).await;
}

/// Close a refused connection with a policy violation frame
///
/// The upgrade always completes; refusal is signaled by the close frame
/// and nothing else is ever sent.
async fn reject(mut socket: WebSocket, address: SocketAddr, error: &AdmissionError) {
    tracing::warn!(address = %address, error = %error, "Connection refused");

    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: error.to_string().into(),
    };

    if socket.send(Message::Close(Some(frame))).await.is_err() {
        tracing::debug!(address = %address, "Client gone before the close frame was written");
    }
}

/// Pump frames for an admitted connection until the socket closes
async fn run_connection(
    state: GatewayState,
    socket: WebSocket,
    connection: Arc<Connection>,
    mut rx: mpsc::Receiver<EventEnvelope>,
) {
    let connection_id = connection.connection_id();
    let (mut ws_sink, mut ws_stream) = socket.split();

    // Drain the outbox onto the socket.
    let send_task = tokio::spawn(async move {
        while let Some(envelope) = rx.recv().await {
            match envelope.to_json() {
                Ok(json) => {
                    if ws_sink.send(Message::Text(json.into())).await.is_err() {
                        tracing::warn!(
                            connection_id = %connection_id,
                            "Failed to write to WebSocket"
                        );
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(
                        connection_id = %connection_id,
                        error = %e,
                        "Failed to serialize outbound event"
                    );
                }
            }
        }

        let _ = ws_sink.close().await;
    });

    while let Some(frame) = ws_stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                handle_frame(&state, &connection, &text).await;
            }
            Ok(Message::Binary(_)) => {
                tracing::debug!(connection_id = %connection_id, "Binary frames not supported");
                connection.try_send(EventEnvelope::error("Binary frames are not supported"));
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Pong replies are written by axum itself.
            }
            Ok(Message::Close(_)) => {
                tracing::info!(connection_id = %connection_id, "Client closed connection");
                break;
            }
            Err(e) => {
                tracing::warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "WebSocket error"
                );
                break;
            }
        }
    }

    state.lifecycle().retire(connection_id, "socket closed");

    // Dropping the last sender closes the outbox; the send task drains
    // what is queued and shuts the sink.
    drop(connection);
    let _ = send_task.await;

    tracing::debug!(
        connection_id = %connection_id,
        remaining = state.registry().connection_count(),
        "Connection task finished"
    );
}

/// Decode and dispatch a single inbound text frame
///
/// Protocol violations answer with an `error` event; only transport
/// failures terminate the connection.
async fn handle_frame(state: &GatewayState, connection: &Arc<Connection>, text: &str) {
    if !connection.is_authenticated() {
        tracing::debug!(
            connection_id = %connection.connection_id(),
            state = ?connection.state(),
            "Frame ignored outside the authenticated state"
        );
        return;
    }

    let envelope = match EventEnvelope::from_json(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            tracing::debug!(
                connection_id = %connection.connection_id(),
                error = %e,
                "Malformed frame"
            );
            connection.try_send(EventEnvelope::error("Invalid message format"));
            return;
        }
    };

    let frame = match envelope.to_client_frame() {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(
                connection_id = %connection.connection_id(),
                error = %e,
                "Rejected frame"
            );
            connection.try_send(EventEnvelope::error(e.to_string()));
            return;
        }
    };

    match frame {
        ClientFrame::ChatMessage { text } => {
            if let Err(e) = state.router().send_public(connection, &text).await {
                connection.try_send(EventEnvelope::error(e.to_string()));
            }
        }
        ClientFrame::PrivateMessage { to_user_id, text } => {
            if let Err(e) = state.router().send_private(connection, to_user_id, &text) {
                connection.try_send(EventEnvelope::error(e.to_string()));
            }
        }
        ClientFrame::TypingStart => state.presence().start_typing(connection),
        ClientFrame::TypingStop => state.presence().stop_typing(connection),
    }
}
