//! Response composition
//!
//! Pure mapping from (intent, entity, outcome) to a natural-language
//! response. Every `ServiceOutcome` variant has a template; the match is
//! exhaustive so adding a variant forces a template decision here.

use std::fmt::Write as _;

use crate::intent::Intent;
use crate::services::{
    FailureReason, ForecastReport, HeadlineList, Payload, ServiceOutcome, StockQuote,
    WeatherReading,
};

/// Fixed prompt returned for unrecognized queries
pub const CLARIFICATION_PROMPT: &str = "I can help with weather, stock prices, and news \
     headlines. Try \"what's the weather in Tokyo?\", \"show me AAPL stock\", or \
     \"get technology news\".";

/// Compose the response text for one turn
///
/// `outcome` is `None` when no service call was made (unknown intent or
/// missing entity). Never fails; garbage input composes to the
/// clarification prompt.
#[must_use]
pub fn compose(intent: Intent, entity: Option<&str>, outcome: Option<&ServiceOutcome>) -> String {
    match (intent, outcome) {
        // An outcome is never attached to an Unknown-intent turn
        (Intent::Unknown, _) => CLARIFICATION_PROMPT.to_string(),
        (_, None) => clarify(intent),
        (_, Some(ServiceOutcome::Success(payload))) => match payload {
            Payload::Weather(reading) => weather_text(reading),
            Payload::Forecast(report) => forecast_text(report),
            Payload::Stock(quote) => stock_text(quote),
            Payload::Headlines(list) => headlines_text(entity, list),
        },
        (_, Some(ServiceOutcome::Failure(reason))) => failure_text(*reason, entity),
    }
}

/// Per-intent clarification when no service call could be made
fn clarify(intent: Intent) -> String {
    match intent {
        Intent::Weather => "Which city would you like the weather for?".to_string(),
        Intent::Stock => "Which stock symbol or company should I look up?".to_string(),
        Intent::News | Intent::Unknown => CLARIFICATION_PROMPT.to_string(),
    }
}

/// Render a temperature without a trailing ".0"
fn format_temp(t: f64) -> String {
    if (t - t.round()).abs() < f64::EPSILON {
        format!("{t:.0}")
    } else {
        format!("{t:.1}")
    }
}

fn weather_text(reading: &WeatherReading) -> String {
    format!(
        "The weather in {} is {}, {}°.",
        reading.city,
        reading.description.to_lowercase(),
        format_temp(reading.temp)
    )
}

fn forecast_text(report: &ForecastReport) -> String {
    let mut text = format!("Weather forecast for {}:\n", report.city);
    for day in &report.days {
        let _ = write!(
            text,
            "{}: {}, {}° to {}°",
            day.date,
            day.description.to_lowercase(),
            format_temp(day.temp_min),
            format_temp(day.temp_max)
        );
        text.push('\n');
    }
    text.trim_end().to_string()
}

fn stock_text(quote: &StockQuote) -> String {
    let direction = if quote.change >= 0.0 { "up" } else { "down" };
    format!(
        "{} is trading at ${:.2}, {} {:.2} ({}) on the day. Open ${:.2}, high ${:.2}, low ${:.2}, previous close ${:.2}.",
        quote.symbol,
        quote.price,
        direction,
        quote.change.abs(),
        quote.change_percent,
        quote.open,
        quote.high,
        quote.low,
        quote.previous_close,
    )
}

fn headlines_text(topic: Option<&str>, list: &HeadlineList) -> String {
    let mut text = match topic {
        Some(topic) => format!("Here's the latest on {topic}:\n"),
        None => "Here are the top headlines:\n".to_string(),
    };

    for (i, article) in list.articles.iter().enumerate() {
        let _ = write!(text, "{}. {}", i + 1, article.title);
        if !article.source.is_empty() {
            let _ = write!(text, " ({})", article.source);
        }
        text.push('\n');
    }

    text.trim_end().to_string()
}

fn failure_text(reason: FailureReason, entity: Option<&str>) -> String {
    let entity = entity.unwrap_or("that");
    match reason {
        FailureReason::NotFound => format!("I couldn't find {entity}."),
        FailureReason::RateLimited => {
            "I'm being rate limited by the data provider. Please try again in a moment."
                .to_string()
        }
        FailureReason::Unreachable => {
            "Sorry, I couldn't reach the data service. Please try again later.".to_string()
        }
        FailureReason::InvalidKey => {
            "The data service rejected my credentials. Please check the API key configuration."
                .to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading() -> WeatherReading {
        WeatherReading {
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
        }
    }

    #[test]
    fn weather_success_template_is_exact() {
        let outcome = ServiceOutcome::Success(Payload::Weather(reading()));
        let text = compose(Intent::Weather, Some("Tokyo"), Some(&outcome));
        assert_eq!(text, "The weather in Tokyo is clear, 20°.");
    }

    #[test]
    fn forecast_lists_one_line_per_day() {
        let report = ForecastReport {
            city: "Berlin".to_string(),
            days: vec![
                crate::services::ForecastDay {
                    date: "2025-01-01".to_string(),
                    description: "Clear Sky".to_string(),
                    temp_min: 1.0,
                    temp_max: 8.5,
                },
                crate::services::ForecastDay {
                    date: "2025-01-02".to_string(),
                    description: "Light Rain".to_string(),
                    temp_min: 3.0,
                    temp_max: 7.0,
                },
            ],
        };
        let outcome = ServiceOutcome::Success(Payload::Forecast(report));
        let text = compose(Intent::Weather, Some("berlin"), Some(&outcome));
        assert!(text.starts_with("Weather forecast for Berlin:"));
        assert!(text.contains("2025-01-01: clear sky, 1° to 8.5°"));
        assert!(text.contains("2025-01-02: light rain, 3° to 7°"));
        assert!(!text.ends_with('\n'));
    }

    #[test]
    fn not_found_template() {
        let outcome = ServiceOutcome::Failure(FailureReason::NotFound);
        let text = compose(Intent::Stock, Some("AAPL"), Some(&outcome));
        assert_eq!(text, "I couldn't find AAPL.");
    }

    #[test]
    fn unknown_intent_gets_clarification_prompt() {
        let text = compose(Intent::Unknown, None, None);
        assert_eq!(text, CLARIFICATION_PROMPT);
    }

    #[test]
    fn missing_entity_asks_for_city() {
        let text = compose(Intent::Weather, None, None);
        assert!(text.contains("Which city"));
    }

    #[test]
    fn missing_entity_asks_for_symbol() {
        let text = compose(Intent::Stock, None, None);
        assert!(text.contains("Which stock"));
    }

    #[test]
    fn fractional_temp_keeps_one_decimal() {
        let mut r = reading();
        r.temp = 19.4;
        let outcome = ServiceOutcome::Success(Payload::Weather(r));
        let text = compose(Intent::Weather, Some("Tokyo"), Some(&outcome));
        assert!(text.contains("19.4°"));
    }

    #[test]
    fn stock_success_mentions_price_and_direction() {
        let quote = StockQuote {
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
        };
        let outcome = ServiceOutcome::Success(Payload::Stock(quote));
        let text = compose(Intent::Stock, Some("AAPL"), Some(&outcome));
        assert!(text.contains("AAPL is trading at $212.33"));
        assert!(text.contains("up 1.83 (0.87%)"));
    }

    #[test]
    fn headlines_are_numbered() {
        let list = HeadlineList {
            articles: vec![
                crate::services::Headline {
                    title: "First".to_string(),
                    description: None,
                    source: "Wire".to_string(),
                    published_at: String::new(),
                    url: String::new(),
                },
                crate::services::Headline {
                    title: "Second".to_string(),
                    description: None,
                    source: String::new(),
                    published_at: String::new(),
                    url: String::new(),
                },
            ],
            total_results: 2,
        };
        let outcome = ServiceOutcome::Success(Payload::Headlines(list));
        let text = compose(Intent::News, None, Some(&outcome));
        assert!(text.starts_with("Here are the top headlines:"));
        assert!(text.contains("1. First (Wire)"));
        assert!(text.contains("2. Second"));
    }

    #[test]
    fn rate_limited_is_apologetic() {
        let outcome = ServiceOutcome::Failure(FailureReason::RateLimited);
        let text = compose(Intent::News, None, Some(&outcome));
        assert!(text.contains("rate limited"));
    }
}
