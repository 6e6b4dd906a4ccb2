//! Conversation history
//!
//! A session holds a bounded rolling window of turns for display purposes
//! only. The router never consults it — each utterance is classified
//! independently. Turns are immutable once recorded; append and evict
//! happen inside a single lock region so concurrent turns cannot corrupt
//! the insertion order.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};

use crate::intent::Intent;
use crate::services::ServiceOutcome;

/// Default number of turns retained per session
pub const DEFAULT_CAPACITY: usize = 32;

/// How an utterance reached the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UtteranceSource {
    Typed,
    Transcribed,
}

/// One piece of user input, immutable once created
#[derive(Debug, Clone)]
pub struct Utterance {
    pub text: String,
    pub source: UtteranceSource,
    pub timestamp: DateTime<Utc>,
}

impl Utterance {
    /// Typed text input, timestamped now
    #[must_use]
    pub fn typed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: UtteranceSource::Typed,
            timestamp: Utc::now(),
        }
    }

    /// Transcribed speech input, timestamped now
    #[must_use]
    pub fn transcribed(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source: UtteranceSource::Transcribed,
            timestamp: Utc::now(),
        }
    }
}

/// One completed request/response exchange
///
/// Invariant: exactly one intent (possibly Unknown), at most one entity,
/// and no outcome when the intent is Unknown.
#[derive(Debug)]
pub struct Turn {
    pub utterance: Utterance,
    pub intent: Intent,
    pub entity: Option<String>,
    pub outcome: Option<ServiceOutcome>,
    pub response: String,
    /// Synthesized MP3 audio; absent when speech is disabled or failed
    pub audio: Option<Vec<u8>>,
}

/// Bounded, append-only sequence of turns scoped to one client connection
#[derive(Debug)]
pub struct ConversationSession {
    capacity: usize,
    turns: Mutex<VecDeque<Arc<Turn>>>,
}

impl ConversationSession {
    /// Create a session retaining at most `capacity` turns
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            turns: Mutex::new(VecDeque::new()),
        }
    }

    /// Append a turn, evicting the oldest past capacity
    pub fn record(&self, turn: Turn) -> Arc<Turn> {
        let turn = Arc::new(turn);
        let mut turns = self.turns.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        turns.push_back(Arc::clone(&turn));
        while turns.len() > self.capacity {
            turns.pop_front();
        }
        turn
    }

    /// The last `n` turns, oldest first
    #[must_use]
    pub fn recent(&self, n: usize) -> Vec<Arc<Turn>> {
        let turns = self.turns.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        turns.iter().rev().take(n).rev().cloned().collect()
    }

    /// Number of retained turns
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
