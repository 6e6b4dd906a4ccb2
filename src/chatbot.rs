//! Conversation engine
//!
//! Ties the router, service clients, composer, and speech adapter together.
//! `handle` is total: every utterance produces a recorded turn with a text
//! response, whatever the services do.

use std::sync::Arc;

use rand::seq::SliceRandom;

use crate::compose::compose;
use crate::intent::{classify, forecast_days, Intent};
use crate::services::{NewsClient, ServiceOutcome, StockClient, WeatherClient};
use crate::session::{ConversationSession, Turn, Utterance};
use crate::voice::SpeechAdapter;

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "good morning", "good afternoon", "good evening"];
const GOODBYE_WORDS: &[&str] = &["bye", "goodbye", "see you", "see ya", "farewell"];
const HELP_WORDS: &[&str] = &["help", "what can you do", "how do you work"];

const GREETING_REPLIES: &[&str] = &[
    "Hello! Ask me about the weather, stock prices, or the news.",
    "Hi there! I can check the weather, look up stocks, or fetch headlines.",
    "Hey! Want the weather, a stock quote, or some news?",
];

const GOODBYE_REPLIES: &[&str] = &[
    "Goodbye! Talk to you later.",
    "See you! Come back anytime.",
];

const HELP_REPLY: &str = "I can tell you the weather or a 5-day forecast for a city, look up \
     a stock price, or read you the latest headlines. Try \"weather in Tokyo\", \
     \"forecast for Berlin\", \"price of AAPL\", or \"news about technology\".";

/// Engine wiring the intent router to the service clients
///
/// Clients are trait objects so tests can substitute fakes without touching
/// the network.
pub struct Chatbot {
    weather: Arc<dyn WeatherClient>,
    stock: Arc<dyn StockClient>,
    news: Arc<dyn NewsClient>,
    speech: Option<Arc<SpeechAdapter>>,
}

impl Chatbot {
    #[must_use]
    pub fn new(
        weather: Arc<dyn WeatherClient>,
        stock: Arc<dyn StockClient>,
        news: Arc<dyn NewsClient>,
    ) -> Self {
        Self {
            weather,
            stock,
            news,
            speech: None,
        }
    }

    /// Attach a speech adapter so responses also get synthesized audio
    #[must_use]
    pub fn with_speech(mut self, speech: Arc<SpeechAdapter>) -> Self {
        self.speech = Some(speech);
        self
    }

    /// Process one utterance end to end and record the resulting turn
    ///
    /// Small talk is answered without touching the router. Otherwise the
    /// utterance is classified, the matching service is called (at most one
    /// network request), and the outcome is rendered to text. Synthesis
    /// failure downgrades to a text-only turn.
    pub async fn handle(&self, utterance: Utterance, session: &ConversationSession) -> Arc<Turn> {
        if let Some(reply) = small_talk_reply(&utterance.text) {
            tracing::debug!(text = %utterance.text, "small talk");
            let audio = self.synthesize(&reply).await;
            return session.record(Turn {
                utterance,
                intent: Intent::Unknown,
                entity: None,
                outcome: None,
                response: reply,
                audio,
            });
        }

        let classification = classify(&utterance.text);
        tracing::debug!(
            intent = %classification.intent,
            entity = ?classification.entity,
            "classified utterance"
        );

        let outcome = self
            .dispatch(
                classification.intent,
                classification.entity.as_deref(),
                forecast_days(&utterance.text),
            )
            .await;
        let response = compose(
            classification.intent,
            classification.entity.as_deref(),
            outcome.as_ref(),
        );
        let audio = self.synthesize(&response).await;

        session.record(Turn {
            utterance,
            intent: classification.intent,
            entity: classification.entity,
            outcome,
            response,
            audio,
        })
    }

    /// Call the service matching the intent; `None` when no call is made
    ///
    /// Weather and stock lookups need an entity; without one the composer
    /// asks for clarification and no request is issued. News treats a
    /// missing entity as "top headlines".
    async fn dispatch(
        &self,
        intent: Intent,
        entity: Option<&str>,
        forecast: Option<u8>,
    ) -> Option<ServiceOutcome> {
        match (intent, entity) {
            (Intent::Weather, Some(city)) => Some(match forecast {
                Some(days) => self.weather.forecast(city, days).await,
                None => self.weather.fetch(city).await,
            }),
            (Intent::Stock, Some(symbol)) => Some(self.stock.fetch(symbol).await),
            (Intent::News, topic) => Some(self.news.fetch(topic).await),
            (Intent::Weather | Intent::Stock, None) | (Intent::Unknown, _) => None,
        }
    }

    async fn synthesize(&self, text: &str) -> Option<Vec<u8>> {
        let speech = self.speech.as_ref()?;
        match speech.synthesize(text).await {
            Ok(audio) => Some(audio),
            Err(e) => {
                tracing::warn!(error = %e, "speech synthesis failed, responding with text only");
                None
            }
        }
    }
}

/// Canned reply for greetings, goodbyes, and help requests
fn small_talk_reply(text: &str) -> Option<String> {
    let normalized = text.trim().to_lowercase();
    let normalized = normalized.trim_end_matches(['!', '.', '?']);
    if normalized.is_empty() {
        return None;
    }

    if HELP_WORDS.iter().any(|w| normalized.contains(w)) {
        return Some(HELP_REPLY.to_string());
    }
    if GREETING_WORDS
        .iter()
        .any(|w| normalized == *w || normalized.starts_with(&format!("{w} ")))
    {
        let reply = GREETING_REPLIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(GREETING_REPLIES[0]);
        return Some(reply.to_string());
    }
    if GOODBYE_WORDS.iter().any(|w| normalized == *w) {
        let reply = GOODBYE_REPLIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(GOODBYE_REPLIES[0]);
        return Some(reply.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greeting_gets_a_canned_reply() {
        assert!(small_talk_reply("Hello!").is_some());
        assert!(small_talk_reply("hey").is_some());
        assert!(small_talk_reply("good morning").is_some());
    }

    #[test]
    fn goodbye_matches_whole_phrase_only() {
        assert!(small_talk_reply("goodbye").is_some());
        // "bye" embedded in a request must not short-circuit the router
        assert!(small_talk_reply("buy stock in apple").is_none());
    }

    #[test]
    fn help_request_explains_capabilities() {
        let reply = small_talk_reply("what can you do?").unwrap();
        assert!(reply.contains("weather"));
        assert!(reply.contains("stock"));
    }

    #[test]
    fn regular_queries_pass_through() {
        assert!(small_talk_reply("weather in Tokyo").is_none());
        assert!(small_talk_reply("").is_none());
    }
}
