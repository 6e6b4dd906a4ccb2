//! WebSocket handler for real-time chat
//!
//! Each connection gets its own bounded conversation session. Messages are
//! handled one at a time in arrival order, so turn ordering within a
//! connection matches what the client sent.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use base64::Engine as _;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::session::{ConversationSession, Utterance};

/// Incoming WebSocket message from client
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsIncoming {
    /// A typed chat message
    UserMessage { message: String },
    /// Ping to keep connection alive
    Ping,
}

/// Outgoing WebSocket message to client
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WsOutgoing {
    /// Bot reply for one user message
    BotMessage {
        message: String,
        intent: String,
        /// Base64-encoded MP3; absent when voice is off or synthesis failed
        #[serde(skip_serializing_if = "Option::is_none")]
        audio: Option<String>,
    },
    /// Error occurred
    Error { message: String },
    /// Pong response
    Pong,
    /// Connection established
    Connected,
}

/// Build WebSocket router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/chat", get(ws_upgrade))
        .with_state(state)
}

/// Handle WebSocket upgrade request
async fn ws_upgrade(State(state): State<Arc<ApiState>>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle WebSocket connection
async fn handle_socket(socket: WebSocket, state: Arc<ApiState>) {
    let (mut sender, mut receiver) = socket.split();
    let session = ConversationSession::new(state.history_cap);

    if send(&mut sender, &WsOutgoing::Connected).await.is_err() {
        return;
    }
    tracing::info!("WebSocket connected");

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let incoming: WsIncoming = match serde_json::from_str(&text) {
            Ok(incoming) => incoming,
            Err(e) => {
                tracing::debug!(error = %e, "unparseable WebSocket message");
                let error = WsOutgoing::Error {
                    message: "Invalid message format".to_string(),
                };
                if send(&mut sender, &error).await.is_err() {
                    break;
                }
                continue;
            }
        };

        let outgoing = match incoming {
            WsIncoming::Ping => WsOutgoing::Pong,
            WsIncoming::UserMessage { message } => {
                let turn = state
                    .chatbot
                    .handle(Utterance::typed(message), &session)
                    .await;
                WsOutgoing::BotMessage {
                    message: turn.response.clone(),
                    intent: turn.intent.as_str().to_string(),
                    audio: turn
                        .audio
                        .as_ref()
                        .map(|bytes| base64::engine::general_purpose::STANDARD.encode(bytes)),
                }
            }
        };

        if send(&mut sender, &outgoing).await.is_err() {
            break;
        }
    }

    tracing::info!(turns = session.len(), "WebSocket disconnected");
}

async fn send(
    sender: &mut (impl SinkExt<Message> + Unpin),
    outgoing: &WsOutgoing,
) -> Result<(), ()> {
    let Ok(text) = serde_json::to_string(outgoing) else {
        return Err(());
    };
    sender.send(Message::Text(text.into())).await.map_err(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_deserializes() {
        let incoming: WsIncoming =
            serde_json::from_str(r#"{"type":"user_message","message":"weather in Tokyo"}"#)
                .unwrap();
        assert!(matches!(incoming, WsIncoming::UserMessage { message } if message == "weather in Tokyo"));
    }

    #[test]
    fn bot_message_serializes_with_type_tag() {
        let outgoing = WsOutgoing::BotMessage {
            message: "It's sunny.".to_string(),
            intent: "weather".to_string(),
            audio: None,
        };
        let json = serde_json::to_string(&outgoing).unwrap();
        assert!(json.contains(r#""type":"bot_message""#));
        assert!(!json.contains("audio"));
    }
}
