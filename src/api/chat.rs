//! REST chat endpoint
//!
//! Stateless counterpart to the WebSocket: each request gets its own
//! single-turn session, so no history carries across calls.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::session::{ConversationSession, Utterance};

/// Build chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new().route("/", post(chat)).with_state(state)
}

/// Chat request
#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

/// Chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    pub intent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
}

/// Answer one chat message
async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ChatError> {
    if request.message.trim().is_empty() {
        return Err(ChatError::BadRequest("Empty message"));
    }

    let session = ConversationSession::new(1);
    let turn = state
        .chatbot
        .handle(Utterance::typed(request.message), &session)
        .await;

    Ok(Json(ChatResponse {
        response: turn.response.clone(),
        intent: turn.intent.as_str().to_string(),
        entity: turn.entity.clone(),
    }))
}

/// Chat API errors
#[derive(Debug)]
pub enum ChatError {
    BadRequest(&'static str),
}

impl IntoResponse for ChatError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
