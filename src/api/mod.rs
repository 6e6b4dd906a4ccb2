//! HTTP API server for the parley gateway

pub mod chat;
pub mod health;
pub mod voice;
pub mod websocket;

use std::sync::Arc;

use axum::response::Html;
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::chatbot::Chatbot;
use crate::voice::SpeechAdapter;
use crate::Result;

/// Embedded single-page chat client
const CHAT_PAGE: &str = include_str!("../../assets/chat.html");

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub chatbot: Arc<Chatbot>,
    /// Speech adapter for the standalone voice endpoints.
    /// Present only when voice is enabled and keys are configured.
    pub speech: Option<Arc<SpeechAdapter>>,
    /// Max turns retained per WebSocket session
    pub history_cap: usize,
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    #[must_use]
    pub fn new(
        chatbot: Arc<Chatbot>,
        speech: Option<Arc<SpeechAdapter>>,
        port: u16,
        history_cap: usize,
    ) -> Self {
        Self {
            state: Arc::new(ApiState {
                chatbot,
                speech,
                history_cap,
            }),
            port,
        }
    }

    /// Build the router with all routes
    fn router(&self) -> Router {
        let router = Router::new()
            .route("/", get(index))
            .nest("/api/chat", chat::router(self.state.clone()))
            .nest("/api/voice", voice::router(self.state.clone()))
            .nest("/ws", websocket::router(self.state.clone()))
            .merge(health::router());

        // CORS layer for cross-origin requests from frontend
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        router.layer(cors).layer(TraceLayer::new_for_http())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

/// Serve the embedded chat client
async fn index() -> Html<&'static str> {
    Html(CHAT_PAGE)
}
