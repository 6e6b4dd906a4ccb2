//! Parley Gateway - Voice chatbot gateway for weather, stocks, and news
//!
//! This library provides the core functionality for the Parley gateway:
//! - Intent routing (rule-based classification of free-form queries)
//! - Service clients for external data providers
//! - Response composition into natural-language text
//! - Optional speech-to-text / text-to-speech via cloud providers
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    Interfaces                        │
//! │     Terminal  │  HTTP API  │  WebSocket chat        │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Parley Gateway                       │
//! │   Intent Router │ Composer │ Session │ STT/TTS      │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              External providers                      │
//! │   OpenWeatherMap │ Alpha Vantage │ NewsAPI │ Speech │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod chatbot;
pub mod compose;
pub mod config;
pub mod error;
pub mod intent;
pub mod services;
pub mod session;
pub mod voice;

pub use chatbot::Chatbot;
pub use compose::compose;
pub use config::Config;
pub use error::{Error, Result};
pub use intent::{Classification, Intent, classify};
pub use services::{FailureReason, Payload, ServiceOutcome};
pub use session::{ConversationSession, Turn, Utterance, UtteranceSource};
pub use voice::SpeechAdapter;
