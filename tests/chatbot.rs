//! End-to-end engine tests with in-process fake service clients

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use parley_gateway::chatbot::Chatbot;
use parley_gateway::compose::CLARIFICATION_PROMPT;
use parley_gateway::services::{
    FailureReason, ForecastDay, ForecastReport, Headline, HeadlineList, NewsClient, Payload,
    ServiceOutcome, StockClient, StockQuote, WeatherClient, WeatherReading,
};
use parley_gateway::session::{ConversationSession, Utterance};
use parley_gateway::Intent;

struct FakeWeather {
    calls: AtomicUsize,
    /// Day counts of forecast calls, in order
    forecast_calls: Mutex<Vec<u8>>,
}

#[async_trait]
impl WeatherClient for FakeWeather {
    async fn fetch(&self, location: &str) -> ServiceOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if location == "atlantis" {
            return ServiceOutcome::Failure(FailureReason::NotFound);
        }
        ServiceOutcome::Success(Payload::Weather(WeatherReading {
            city: "Tokyo".to_string(),
            country: "JP".to_string(),
            description: "Clear".to_string(),
            temp: 20.0,
            feels_like: 19.0,
            temp_min: 18.0,
            temp_max: 22.0,
            humidity: 40,
            pressure: 1013,
            wind_speed: 2.5,
        }))
    }

    async fn forecast(&self, _location: &str, days: u8) -> ServiceOutcome {
        self.forecast_calls.lock().unwrap().push(days);
        ServiceOutcome::Success(Payload::Forecast(ForecastReport {
            city: "Berlin".to_string(),
            days: vec![ForecastDay {
                date: "2025-01-01".to_string(),
                description: "Clear Sky".to_string(),
                temp_min: 1.0,
                temp_max: 8.0,
            }],
        }))
    }
}

struct FakeStock;

#[async_trait]
impl StockClient for FakeStock {
    async fn fetch(&self, symbol_or_name: &str) -> ServiceOutcome {
        if symbol_or_name == "AAPL" {
            return ServiceOutcome::Success(Payload::Stock(StockQuote {
                symbol: "AAPL".to_string(),
                open: 210.0,
                high: 215.5,
                low: 208.25,
                price: 212.33,
                volume: 1_000_000,
                latest_trading_day: "2025-01-02".to_string(),
                previous_close: 210.5,
                change: 1.83,
                change_percent: "0.87%".to_string(),
            }));
        }
        ServiceOutcome::Failure(FailureReason::NotFound)
    }
}

/// Records the topic it was asked for
struct FakeNews {
    topics: Mutex<Vec<Option<String>>>,
}

#[async_trait]
impl NewsClient for FakeNews {
    async fn fetch(&self, topic: Option<&str>) -> ServiceOutcome {
        self.topics
            .lock()
            .unwrap()
            .push(topic.map(str::to_string));
        ServiceOutcome::Success(Payload::Headlines(HeadlineList {
            articles: vec![Headline {
                title: "Something happened".to_string(),
                description: None,
                source: "Wire".to_string(),
                published_at: String::new(),
                url: String::new(),
            }],
            total_results: 1,
        }))
    }
}

fn engine() -> (Arc<FakeWeather>, Arc<FakeNews>, Chatbot) {
    let weather = Arc::new(FakeWeather {
        calls: AtomicUsize::new(0),
        forecast_calls: Mutex::new(Vec::new()),
    });
    let news = Arc::new(FakeNews {
        topics: Mutex::new(Vec::new()),
    });
    let chatbot = Chatbot::new(weather.clone(), Arc::new(FakeStock), news.clone());
    (weather, news, chatbot)
}

#[tokio::test]
async fn weather_query_calls_service_and_uses_template() {
    let (weather, _, chatbot) = engine();
    let session = ConversationSession::default();

    let turn = chatbot
        .handle(Utterance::typed("what's the weather in Tokyo?"), &session)
        .await;

    assert_eq!(turn.intent, Intent::Weather);
    assert_eq!(turn.entity.as_deref(), Some("tokyo"));
    assert_eq!(weather.calls.load(Ordering::SeqCst), 1);
    assert!(weather.forecast_calls.lock().unwrap().is_empty());
    assert_eq!(turn.response, "The weather in Tokyo is clear, 20°.");
}

#[tokio::test]
async fn forecast_query_uses_the_forecast_endpoint() {
    let (weather, _, chatbot) = engine();
    let session = ConversationSession::default();

    let turn = chatbot
        .handle(Utterance::typed("3 day forecast for Berlin"), &session)
        .await;

    assert_eq!(turn.intent, Intent::Weather);
    assert_eq!(turn.entity.as_deref(), Some("berlin"));
    assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    assert_eq!(weather.forecast_calls.lock().unwrap().as_slice(), &[3]);
    assert!(turn.response.starts_with("Weather forecast for Berlin:"));
    assert!(turn.response.contains("2025-01-01: clear sky, 1° to 8°"));
}

#[tokio::test]
async fn weather_without_city_asks_and_skips_the_service() {
    let (weather, _, chatbot) = engine();
    let session = ConversationSession::default();

    let turn = chatbot
        .handle(Utterance::typed("what's the weather like?"), &session)
        .await;

    assert_eq!(turn.intent, Intent::Weather);
    assert!(turn.entity.is_none());
    assert!(turn.outcome.is_none());
    assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    assert!(turn.response.contains("Which city"));
}

#[tokio::test]
async fn stock_query_resolves_company_alias() {
    let (_, _, chatbot) = engine();
    let session = ConversationSession::default();

    let turn = chatbot
        .handle(Utterance::typed("price of apple stock"), &session)
        .await;

    assert_eq!(turn.intent, Intent::Stock);
    assert_eq!(turn.entity.as_deref(), Some("AAPL"));
    assert!(turn.response.contains("AAPL is trading at $212.33"));
}

#[tokio::test]
async fn stock_not_found_names_the_entity() {
    let (_, _, chatbot) = engine();
    let session = ConversationSession::default();

    let turn = chatbot
        .handle(Utterance::typed("stock price of ZZZZ"), &session)
        .await;

    assert_eq!(turn.intent, Intent::Stock);
    assert_eq!(turn.response, "I couldn't find ZZZZ.");
}

#[tokio::test]
async fn news_without_topic_fetches_top_headlines() {
    let (_, news, chatbot) = engine();
    let session = ConversationSession::default();

    let turn = chatbot
        .handle(Utterance::typed("give me the news"), &session)
        .await;

    assert_eq!(turn.intent, Intent::News);
    assert_eq!(news.topics.lock().unwrap().as_slice(), &[None]);
    assert!(turn.response.starts_with("Here are the top headlines:"));
}

#[tokio::test]
async fn news_topic_is_passed_through() {
    let (_, news, chatbot) = engine();
    let session = ConversationSession::default();

    chatbot
        .handle(Utterance::typed("news about technology"), &session)
        .await;

    let topics = news.topics.lock().unwrap();
    assert_eq!(topics.as_slice(), &[Some("technology".to_string())]);
}

#[tokio::test]
async fn unknown_query_gets_the_clarification_prompt() {
    let (weather, _, chatbot) = engine();
    let session = ConversationSession::default();

    let turn = chatbot
        .handle(Utterance::typed("sing me a song"), &session)
        .await;

    assert_eq!(turn.intent, Intent::Unknown);
    assert!(turn.outcome.is_none());
    assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    assert_eq!(turn.response, CLARIFICATION_PROMPT);
}

#[tokio::test]
async fn weather_failure_composes_not_found() {
    let (_, _, chatbot) = engine();
    let session = ConversationSession::default();

    let turn = chatbot
        .handle(Utterance::typed("weather in Atlantis"), &session)
        .await;

    assert_eq!(turn.response, "I couldn't find atlantis.");
}

#[tokio::test]
async fn turns_are_recorded_in_order_and_evicted() {
    let (_, _, chatbot) = engine();
    let session = ConversationSession::new(2);

    chatbot.handle(Utterance::typed("hello"), &session).await;
    chatbot
        .handle(Utterance::typed("weather in Tokyo"), &session)
        .await;
    chatbot
        .handle(Utterance::typed("news please"), &session)
        .await;

    let recent = session.recent(10);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].utterance.text, "weather in Tokyo");
    assert_eq!(recent[1].utterance.text, "news please");
}

#[tokio::test]
async fn greeting_is_answered_without_classification() {
    let (weather, news, chatbot) = engine();
    let session = ConversationSession::default();

    let turn = chatbot.handle(Utterance::typed("hello!"), &session).await;

    assert_eq!(turn.intent, Intent::Unknown);
    assert!(turn.outcome.is_none());
    assert_eq!(weather.calls.load(Ordering::SeqCst), 0);
    assert!(news.topics.lock().unwrap().is_empty());
    assert!(!turn.response.is_empty());
    assert_ne!(turn.response, CLARIFICATION_PROMPT);
}

#[tokio::test]
async fn text_turns_carry_no_audio_without_a_speech_adapter() {
    let (_, _, chatbot) = engine();
    let session = ConversationSession::default();

    let turn = chatbot
        .handle(Utterance::typed("weather in Tokyo"), &session)
        .await;

    assert!(turn.audio.is_none());
}
