//! Rule-based intent routing
//!
//! Classifies a free-form utterance into a closed set of intents and
//! extracts the single entity the intent needs (city, ticker, topic).
//! Dispatch is an explicit ordered list of (matcher, intent) pairs; the
//! first match wins, so Weather > Stock > News is a fixed priority and the
//! result is deterministic. Classification never fails — the worst case is
//! [`Intent::Unknown`] with no entity.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::services::news::CATEGORIES;

/// What kind of information the user wants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Weather,
    Stock,
    News,
    Unknown,
}

impl Intent {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Stock => "stock",
            Self::News => "news",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying one utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub intent: Intent,
    /// City, ticker, or topic; absent when unresolved (or for top headlines)
    pub entity: Option<String>,
}

impl Classification {
    const fn unknown() -> Self {
        Self {
            intent: Intent::Unknown,
            entity: None,
        }
    }
}

const WEATHER_KEYWORDS: &[&str] = &["weather", "whether", "forecast", "temperature"];
const STOCK_KEYWORDS: &[&str] = &["stock", "share price"];
const NEWS_KEYWORDS: &[&str] = &["news", "headline"];

/// Ticker symbols recognized directly in the query text
const KNOWN_TICKERS: &[&str] = &[
    "aapl", "msft", "googl", "amzn", "tsla", "meta", "nvda", "intc", "amd", "nflx",
];

/// Company name to ticker, consulted before treating a token as a ticker
const TICKER_ALIASES: &[(&str, &str)] = &[
    ("apple", "AAPL"),
    ("microsoft", "MSFT"),
    ("google", "GOOGL"),
    ("alphabet", "GOOGL"),
    ("amazon", "AMZN"),
    ("tesla", "TSLA"),
    ("meta", "META"),
    ("facebook", "META"),
    ("nvidia", "NVDA"),
    ("intel", "INTC"),
    ("amd", "AMD"),
    ("netflix", "NFLX"),
];

/// Trailing time words stripped from extracted locations
const TIME_WORDS: &[&str] = &["today", "tomorrow", "now", "tonight", "this week", "next week"];

/// Leading filler stripped from "<company> stock" style queries
const LEADING_FILLER: &[&str] = &[
    "show", "me", "the", "what", "what's", "whats", "is", "how", "get", "a", "an", "please",
];

type Matcher = fn(&str) -> bool;
type Extractor = fn(&str) -> Option<String>;

/// Ordered dispatch table; evaluation order is the intent priority
const DISPATCH: &[(Matcher, Intent, Extractor)] = &[
    (mentions_weather, Intent::Weather, weather_entity),
    (mentions_stock, Intent::Stock, stock_entity),
    (mentions_news, Intent::News, news_entity),
];

/// Classify an utterance into an intent and an optional entity
///
/// Pure and idempotent; empty or unrecognized input yields
/// `(Unknown, None)`.
#[must_use]
pub fn classify(utterance: &str) -> Classification {
    let query = utterance.trim().to_lowercase();
    if query.is_empty() {
        return Classification::unknown();
    }

    for (matches, intent, extract) in DISPATCH {
        if matches(&query) {
            return Classification {
                intent: *intent,
                entity: extract(&query),
            };
        }
    }

    Classification::unknown()
}

fn mentions_weather(query: &str) -> bool {
    WEATHER_KEYWORDS.iter().any(|kw| query.contains(kw))
}

fn mentions_stock(query: &str) -> bool {
    STOCK_KEYWORDS.iter().any(|kw| query.contains(kw))
        || tokens(query).any(|t| KNOWN_TICKERS.contains(&t))
}

fn mentions_news(query: &str) -> bool {
    NEWS_KEYWORDS.iter().any(|kw| query.contains(kw))
}

/// Whitespace tokens with surrounding punctuation trimmed
fn tokens(query: &str) -> impl Iterator<Item = &str> {
    query
        .split_whitespace()
        .map(|t| t.trim_matches(|c: char| c.is_ascii_punctuation()))
        .filter(|t| !t.is_empty())
}

/// Text after the first " in " or " for ", the usual location markers
fn location_tail(query: &str) -> Option<&str> {
    query
        .find(" in ")
        .map(|i| &query[i + 4..])
        .or_else(|| query.find(" for ").map(|i| &query[i + 5..]))
}

/// Extract a city ("tokyo", "london,gb") from a weather query
fn weather_entity(query: &str) -> Option<String> {
    let mut tail = location_tail(query)?.trim().to_string();

    // Speech often appends time words to the location phrase
    loop {
        let before = tail.len();
        for word in TIME_WORDS {
            if let Some(stripped) = tail.strip_suffix(word) {
                tail = stripped.trim_end().to_string();
            }
        }
        if tail.len() == before {
            break;
        }
    }

    let tail = tail
        .trim_end_matches(['?', '.', '!', ','])
        .trim()
        .replace(", ", ",");

    (!tail.is_empty()).then_some(tail)
}

/// Map a company name or token to a ticker; unrecognized single tokens are
/// upper-cased, longer phrases pass through for provider-side search
fn resolve_ticker(phrase: &str) -> String {
    let phrase = phrase.trim_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());

    if let Some((_, ticker)) = TICKER_ALIASES.iter().find(|(name, _)| *name == phrase) {
        return (*ticker).to_string();
    }
    if !phrase.contains(' ') && phrase.len() <= 5 {
        return phrase.to_uppercase();
    }
    phrase.to_string()
}

/// Extract a ticker or company name from a stock query
fn stock_entity(query: &str) -> Option<String> {
    // "what's the stock price of apple?"
    if let Some(i) = query.find(" of ") {
        let tail: String = tokens(&query[i + 4..])
            .filter(|t| *t != "stock" && *t != "price")
            .collect::<Vec<_>>()
            .join(" ");
        if !tail.is_empty() {
            return Some(resolve_ticker(&tail));
        }
    }

    // "aapl stock" — leading ticker token
    if let Some(first) = tokens(query).next() {
        if KNOWN_TICKERS.contains(&first) {
            return Some(first.to_uppercase());
        }
    }

    // "show me apple stock price" — phrase before " stock"
    if let Some(i) = query.find(" stock") {
        let head: Vec<&str> = tokens(&query[..i])
            .skip_while(|t| LEADING_FILLER.contains(t))
            .collect();
        if !head.is_empty() {
            return Some(resolve_ticker(&head.join(" ")));
        }
    }

    None
}

/// Days of forecast requested, when the utterance asks for one
///
/// "forecast" alone means the provider maximum of five days; "<n> day
/// forecast" clamps n into 1..=5. `None` means current conditions.
#[must_use]
pub fn forecast_days(utterance: &str) -> Option<u8> {
    let query = utterance.trim().to_lowercase();
    if !query.contains("forecast") {
        return None;
    }

    let days = day_count_regex()
        .captures(&query)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<u8>().ok())
        .unwrap_or(5);
    Some(days.clamp(1, 5))
}

fn day_count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\d+)[ -]?day").expect("valid day count pattern"))
}

fn category_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(technology|business|sports|entertainment|health|science)\b")
            .expect("valid category pattern")
    })
}

fn topic_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:news|headlines?)\s+(?:about|on)\s+([a-z0-9 ]+)")
            .expect("valid topic pattern")
    })
}

/// Extract a category or topic from a news query; `None` means top headlines
fn news_entity(query: &str) -> Option<String> {
    if let Some(m) = category_regex().captures(query).and_then(|c| c.get(1)) {
        let category = m.as_str();
        debug_assert!(CATEGORIES.contains(&category));
        return Some(category.to_string());
    }

    if let Some(m) = topic_regex().captures(query).and_then(|c| c.get(1)) {
        let topic = m.as_str().trim().trim_end_matches(['?', '.', '!']).trim();
        if !topic.is_empty() {
            return Some(topic.to_string());
        }
    }

    None
}
