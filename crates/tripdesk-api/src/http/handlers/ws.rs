//! WebSocket handler for the live chat channel.
//!
//! `GET /ws/chat` upgrades an authenticated HTTP connection to a
//! WebSocket. Authentication happens before the upgrade: a missing or
//! invalid token is a 401 and the connection never joins a room.
//!
//! Once connected, the principal joins its private room always, plus the
//! shared admins' room when it holds admin privilege. The handler then:
//!
//! - **Forwards room traffic:** every [`ChatEvent`] broadcast into a
//!   joined room is pushed to the client as a JSON text frame.
//! - **Receives commands:** parses incoming text frames as [`WsCommand`]
//!   and routes them through the chat service.
//!
//! Refused commands produce a connection-local `error` frame; the
//! fire-and-forget success path emits nothing to the sender beyond the
//! room echo. Lagged receivers (a client too slow to keep up) are logged
//! and skipped past. Room membership is connection-scoped: dropping the
//! receivers at disconnect is the only cleanup.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use uuid::Uuid;

use tripdesk_core::chat::room::RoomId;
use tripdesk_core::chat::service::SessionRef;
use tripdesk_types::chat::{ChatEvent, ChatRole};
use tripdesk_types::error::ChatError;
use tripdesk_types::user::User;

use crate::http::extractors::auth::CurrentUser;
use crate::state::AppState;

/// Incoming command from a WebSocket client.
///
/// Clients send JSON-encoded text frames matching one of these variants.
/// Unknown or malformed messages are logged and ignored.
#[derive(Debug, serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WsCommand {
    /// Send a chat message. `user_id` names the target thread and is
    /// required from admins; user senders always target their own thread.
    SendMessage {
        #[serde(default)]
        user_id: Option<Uuid>,
        content: String,
    },
    /// Mark counterpart messages in a thread as read (admin only).
    MarkMessagesRead {
        #[serde(default)]
        session_id: Option<Uuid>,
        #[serde(default)]
        user_id: Option<Uuid>,
    },
    /// Keep-alive ping. Server responds with `{"type":"pong"}`.
    Ping,
}

/// Upgrade an HTTP request to a WebSocket connection for live chat.
///
/// This is mounted at `/ws/chat` in the router. The `CurrentUser`
/// extractor runs first, so unauthenticated attempts are rejected with
/// 401 before any upgrade or room membership.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    auth: CurrentUser,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_chat_connection(socket, state, auth.user))
}

/// Receive from the admins' room when the principal is a member,
/// otherwise park forever so the select arm never fires.
async fn recv_admin_room(
    rx: &mut Option<broadcast::Receiver<ChatEvent>>,
) -> Result<ChatEvent, broadcast::error::RecvError> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Core WebSocket connection handler.
///
/// Uses `tokio::select!` to multiplex between the joined rooms' broadcast
/// receivers, incoming client frames, and the process shutdown token.
/// Keeping sender and receiver in one task enables bidirectional
/// communication (error acknowledgments, pongs).
async fn handle_chat_connection(socket: WebSocket, state: AppState, user: User) {
    let (mut ws_sender, mut ws_receiver) = socket.split();

    // Join rooms: the private room always, the admins' room on privilege.
    let mut private_rx = state.rooms.join(RoomId::User(user.id));
    let mut admin_rx = if user.is_admin {
        Some(state.rooms.join(RoomId::Admins))
    } else {
        None
    };

    tracing::debug!(user_id = %user.id, is_admin = user.is_admin, "chat connection joined rooms");

    loop {
        tokio::select! {
            // --- Branch 1: private room traffic ---
            event_result = private_rx.recv() => {
                if !forward_event(event_result, &mut ws_sender).await {
                    break;
                }
            }

            // --- Branch 2: admins' room traffic (admins only) ---
            event_result = recv_admin_room(&mut admin_rx) => {
                if !forward_event(event_result, &mut ws_sender).await {
                    break;
                }
            }

            // --- Branch 3: commands from the client ---
            msg_result = ws_receiver.next() => {
                match msg_result {
                    Some(Ok(Message::Text(text))) => {
                        process_command(&text, &mut ws_sender, &state, &user).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        // Client disconnected
                        break;
                    }
                    Some(Err(err)) => {
                        tracing::debug!("WebSocket receive error: {err}");
                        break;
                    }
                    // Ignore binary, ping, pong protocol frames (handled by axum/tungstenite)
                    Some(Ok(_)) => {}
                }
            }

            // --- Branch 4: graceful shutdown ---
            _ = state.shutdown.cancelled() => {
                let _ = ws_sender.send(Message::Close(None)).await;
                break;
            }
        }
    }

    tracing::debug!(user_id = %user.id, "chat connection closed");
}

/// Push one room event to the client. Returns false when the connection
/// should be torn down.
async fn forward_event(
    event_result: Result<ChatEvent, broadcast::error::RecvError>,
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
) -> bool {
    match event_result {
        Ok(event) => match serde_json::to_string(&event) {
            Ok(json) => ws_sender.send(Message::Text(json.into())).await.is_ok(),
            Err(err) => {
                tracing::warn!("Failed to serialize ChatEvent: {err}");
                true
            }
        },
        Err(broadcast::error::RecvError::Lagged(n)) => {
            tracing::warn!(skipped = n, "WebSocket subscriber lagged, skipping {n} events");
            // Continue receiving -- the client will miss some events
            // but will catch up with the next ones.
            true
        }
        Err(broadcast::error::RecvError::Closed) => false,
    }
}

/// Parse and process a single command from the WebSocket client.
async fn process_command(
    text: &str,
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    state: &AppState,
    user: &User,
) {
    let cmd: WsCommand = match serde_json::from_str(text) {
        Ok(cmd) => cmd,
        Err(err) => {
            tracing::warn!(
                raw = %text,
                error = %err,
                "Ignoring malformed WebSocket command"
            );
            return;
        }
    };

    match cmd {
        WsCommand::SendMessage { user_id, content } => {
            // Non-admin senders always target their own thread; a supplied
            // target is ignored rather than trusted.
            let target = if user.is_admin { user_id } else { None };
            match state.chat_service.route_message(user, target, &content).await {
                Ok(Some(_)) => {
                    // Success is fire-and-forget: the sender hears its own
                    // message through the echo room.
                }
                Ok(None) => {
                    send_error(ws_sender, "EMPTY_CONTENT", "message content is empty").await;
                }
                Err(err) => {
                    tracing::debug!(user_id = %user.id, error = %err, "send_message refused");
                    send_error(ws_sender, chat_error_code(&err), &err.to_string()).await;
                }
            }
        }
        WsCommand::MarkMessagesRead { session_id, user_id } => {
            if !user.is_admin {
                send_error(ws_sender, "ADMIN_REQUIRED", "admin privilege required").await;
                return;
            }
            let session_ref = match (session_id, user_id) {
                (Some(id), _) => SessionRef::Id(id),
                (None, Some(uid)) => SessionRef::User(uid),
                (None, None) => {
                    send_error(ws_sender, "VALIDATION_ERROR", "session_id or user_id required")
                        .await;
                    return;
                }
            };
            // An unresolvable session is a no-op, not an error.
            match state.chat_service.mark_read(ChatRole::Admin, session_ref).await {
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "mark_messages_read failed");
                    send_error(ws_sender, chat_error_code(&err), &err.to_string()).await;
                }
            }
        }
        WsCommand::Ping => {
            let pong = r#"{"type":"pong"}"#;
            if ws_sender.send(Message::Text(pong.into())).await.is_err() {
                tracing::debug!("Failed to send pong (client disconnecting)");
            }
        }
    }
}

/// Send a connection-local error frame. Rooms never see these.
async fn send_error(
    ws_sender: &mut (impl SinkExt<Message, Error = axum::Error> + Unpin),
    code: &str,
    message: &str,
) {
    let frame = serde_json::json!({
        "type": "error",
        "code": code,
        "message": message,
    });
    if ws_sender
        .send(Message::Text(frame.to_string().into()))
        .await
        .is_err()
    {
        tracing::debug!("Failed to send error frame (client disconnecting)");
    }
}

/// Stable machine-readable code for a refused chat operation.
fn chat_error_code(err: &ChatError) -> &'static str {
    match err {
        ChatError::SessionNotFound => "SESSION_NOT_FOUND",
        ChatError::UserNotFound => "USER_NOT_FOUND",
        ChatError::TargetRequired | ChatError::EmptyContent => "VALIDATION_ERROR",
        ChatError::AdminRequired => "ADMIN_REQUIRED",
        ChatError::StorageError(_) => "INTERNAL_ERROR",
    }
}
