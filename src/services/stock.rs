//! Stock quote client for Alpha Vantage

use async_trait::async_trait;
use serde::Deserialize;

use super::{FailureReason, Payload, ServiceOutcome, StockClient};

const BASE_URL: &str = "https://www.alphavantage.co/query";

/// One parsed global quote
#[derive(Debug, Clone)]
pub struct StockQuote {
    pub symbol: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub price: f64,
    pub volume: u64,
    pub latest_trading_day: String,
    pub previous_close: f64,
    pub change: f64,
    /// As reported by the provider, e.g. "1.23%"
    pub change_percent: String,
}

/// Alpha Vantage reports every numeric field as a string
#[derive(Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "Global Quote")]
    global_quote: Option<RawQuote>,
}

#[derive(Deserialize, Default)]
struct RawQuote {
    #[serde(rename = "01. symbol", default)]
    symbol: String,
    #[serde(rename = "02. open", default)]
    open: String,
    #[serde(rename = "03. high", default)]
    high: String,
    #[serde(rename = "04. low", default)]
    low: String,
    #[serde(rename = "05. price", default)]
    price: String,
    #[serde(rename = "06. volume", default)]
    volume: String,
    #[serde(rename = "07. latest trading day", default)]
    latest_trading_day: String,
    #[serde(rename = "08. previous close", default)]
    previous_close: String,
    #[serde(rename = "09. change", default)]
    change: String,
    #[serde(rename = "10. change percent", default)]
    change_percent: String,
}

#[derive(Deserialize)]
struct SearchEnvelope {
    #[serde(rename = "bestMatches", default)]
    best_matches: Vec<SearchMatch>,
}

#[derive(Deserialize)]
struct SearchMatch {
    #[serde(rename = "1. symbol", default)]
    symbol: String,
}

/// Fetches stock quotes from Alpha Vantage
pub struct StockService {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl StockService {
    /// Create a new stock client. An empty key is allowed; fetches will
    /// fail with `InvalidKey` without hitting the network.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        Self {
            client: super::http_client(),
            api_key,
            base_url: BASE_URL.to_string(),
        }
    }

    /// Override the API base URL (used by tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Resolve a company name to its best-matching ticker symbol
    async fn resolve_symbol(&self, keywords: &str) -> Result<Option<String>, FailureReason> {
        let envelope: SearchEnvelope = self
            .get(&[("function", "SYMBOL_SEARCH"), ("keywords", keywords)])
            .await?;

        Ok(envelope
            .best_matches
            .into_iter()
            .map(|m| m.symbol)
            .find(|s| !s.is_empty()))
    }

    async fn quote(&self, symbol: &str) -> Result<StockQuote, FailureReason> {
        let symbol = symbol.to_uppercase();
        let envelope: QuoteEnvelope = self
            .get(&[("function", "GLOBAL_QUOTE"), ("symbol", &symbol)])
            .await?;

        let raw = envelope.global_quote.ok_or(FailureReason::NotFound)?;
        if raw.symbol.is_empty() {
            // Alpha Vantage returns an empty quote object for unknown symbols
            return Err(FailureReason::NotFound);
        }

        Ok(StockQuote {
            symbol: raw.symbol,
            open: parse_num(&raw.open),
            high: parse_num(&raw.high),
            low: parse_num(&raw.low),
            price: parse_num(&raw.price),
            volume: raw.volume.parse().unwrap_or(0),
            latest_trading_day: raw.latest_trading_day,
            previous_close: parse_num(&raw.previous_close),
            change: parse_num(&raw.change),
            change_percent: raw.change_percent,
        })
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        params: &[(&str, &str)],
    ) -> Result<T, FailureReason> {
        let response = self
            .client
            .get(&self.base_url)
            .query(params)
            .query(&[("apikey", &self.api_key)])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "stock request failed");
                super::reason_for_transport(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "stock API error");
            return Err(super::reason_for_status(status));
        }

        response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to parse stock response");
            FailureReason::Unreachable
        })
    }
}

fn parse_num(s: &str) -> f64 {
    s.parse().unwrap_or(0.0)
}

/// True if the token plausibly is a ticker already ("AAPL", "msft")
fn looks_like_ticker(s: &str) -> bool {
    !s.is_empty() && s.len() <= 5 && s.chars().all(|c| c.is_ascii_alphabetic())
}

#[async_trait]
impl StockClient for StockService {
    async fn fetch(&self, symbol_or_name: &str) -> ServiceOutcome {
        if self.api_key.is_empty() {
            return ServiceOutcome::Failure(FailureReason::InvalidKey);
        }

        // Company names go through symbol search first; ticker-shaped input
        // is quoted directly
        let result = if looks_like_ticker(symbol_or_name) {
            self.quote(symbol_or_name).await
        } else {
            match self.resolve_symbol(symbol_or_name).await {
                Ok(Some(symbol)) => {
                    tracing::debug!(input = symbol_or_name, symbol = %symbol, "resolved symbol");
                    self.quote(&symbol).await
                }
                Ok(None) => self.quote(symbol_or_name).await,
                Err(reason) => Err(reason),
            }
        };

        match result {
            Ok(quote) => {
                tracing::debug!(symbol = %quote.symbol, price = quote.price, "quote fetched");
                ServiceOutcome::Success(Payload::Stock(quote))
            }
            Err(reason) => ServiceOutcome::Failure(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_shape_detection() {
        assert!(looks_like_ticker("AAPL"));
        assert!(looks_like_ticker("v"));
        assert!(!looks_like_ticker("berkshire hathaway"));
        assert!(!looks_like_ticker("GOOGLE1"));
        assert!(!looks_like_ticker(""));
    }

    #[test]
    fn empty_quote_is_not_found() {
        let json = r#"{"Global Quote": {}}"#;
        let envelope: QuoteEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.global_quote.is_some_and(|q| q.symbol.is_empty()));
    }

    #[tokio::test]
    async fn empty_key_fails_without_network() {
        let service = StockService::new(String::new());
        let outcome = service.fetch("AAPL").await;
        assert!(matches!(
            outcome,
            ServiceOutcome::Failure(FailureReason::InvalidKey)
        ));
    }
}
