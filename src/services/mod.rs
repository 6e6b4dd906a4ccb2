//! Service clients for external data providers
//!
//! Each client issues a single best-effort HTTP request and parses the JSON
//! response into a plain record. No retries, caching, or pooling. Transport
//! errors, timeouts, and non-2xx statuses are all folded into
//! [`ServiceOutcome::Failure`] with a best-guess reason, so fetching never
//! returns a hard error.

pub mod news;
pub mod stock;
pub mod weather;

use std::time::Duration;

use async_trait::async_trait;

pub use news::{Headline, HeadlineList, NewsService};
pub use stock::{StockQuote, StockService};
pub use weather::{ForecastDay, ForecastReport, WeatherReading, WeatherService};

/// Per-request timeout applied to every provider call
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Why a provider call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    /// The provider has no data for the requested entity
    NotFound,
    /// The provider throttled us
    RateLimited,
    /// Transport failure, timeout, or unexpected response shape
    Unreachable,
    /// Missing or rejected API key
    InvalidKey,
}

/// Parsed payload from a successful provider call
#[derive(Debug, Clone)]
pub enum Payload {
    Weather(WeatherReading),
    Forecast(ForecastReport),
    Stock(StockQuote),
    Headlines(HeadlineList),
}

/// Tagged outcome of calling an external data provider
#[derive(Debug, Clone)]
pub enum ServiceOutcome {
    Success(Payload),
    Failure(FailureReason),
}

impl ServiceOutcome {
    /// True if the call produced a payload
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Weather data provider
#[async_trait]
pub trait WeatherClient: Send + Sync {
    /// Fetch current conditions for a location ("Tokyo" or "London,GB")
    async fn fetch(&self, location: &str) -> ServiceOutcome;

    /// Fetch a multi-day forecast for a location
    async fn forecast(&self, location: &str, days: u8) -> ServiceOutcome;
}

/// Stock quote provider
#[async_trait]
pub trait StockClient: Send + Sync {
    /// Fetch a quote for a ticker symbol or company name
    async fn fetch(&self, symbol_or_name: &str) -> ServiceOutcome;
}

/// News headline provider
#[async_trait]
pub trait NewsClient: Send + Sync {
    /// Fetch headlines; `topic` absent means top headlines
    async fn fetch(&self, topic: Option<&str>) -> ServiceOutcome;
}

/// Map an HTTP status to a failure reason
pub(crate) fn reason_for_status(status: reqwest::StatusCode) -> FailureReason {
    use reqwest::StatusCode;
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => FailureReason::InvalidKey,
        StatusCode::NOT_FOUND => FailureReason::NotFound,
        StatusCode::TOO_MANY_REQUESTS => FailureReason::RateLimited,
        _ => FailureReason::Unreachable,
    }
}

/// Map a transport error to a failure reason
pub(crate) fn reason_for_transport(err: &reqwest::Error) -> FailureReason {
    err.status().map_or(FailureReason::Unreachable, reason_for_status)
}

/// Shared HTTP client with the provider timeout applied
pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}
