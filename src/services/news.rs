//! Headline client for NewsAPI.org

use async_trait::async_trait;
use serde::Deserialize;

use super::{FailureReason, NewsClient, Payload, ServiceOutcome};

const BASE_URL: &str = "https://newsapi.org/v2";

/// Articles returned per request
const PAGE_SIZE: &str = "5";

/// Categories supported by the top-headlines endpoint
pub const CATEGORIES: &[&str] = &[
    "business",
    "entertainment",
    "general",
    "health",
    "science",
    "sports",
    "technology",
];

/// One parsed article
#[derive(Debug, Clone)]
pub struct Headline {
    pub title: String,
    pub description: Option<String>,
    pub source: String,
    pub published_at: String,
    pub url: String,
}

/// A page of articles plus the provider's total count
#[derive(Debug, Clone)]
pub struct HeadlineList {
    pub articles: Vec<Headline>,
    pub total_results: u32,
}

#[derive(Deserialize)]
struct NewsEnvelope {
    #[serde(default)]
    status: String,
    #[serde(rename = "totalResults", default)]
    total_results: u32,
    #[serde(default)]
    articles: Vec<RawArticle>,
}

#[derive(Deserialize)]
struct RawArticle {
    title: Option<String>,
    description: Option<String>,
    url: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    #[serde(default)]
    source: RawSource,
}

#[derive(Deserialize, Default)]
struct RawSource {
    name: Option<String>,
}

/// Fetches headlines from NewsAPI
pub struct NewsService {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl NewsService {
    /// Create a new news client. An empty key is allowed; fetches will
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

    /// Top US headlines, optionally filtered by category
    async fn top_headlines(&self, category: Option<&str>) -> Result<HeadlineList, FailureReason> {
        let url = format!("{}/top-headlines", self.base_url);
        let mut params = vec![("country", "us"), ("pageSize", PAGE_SIZE)];
        if let Some(category) = category {
            params.push(("category", category));
        }
        self.get(&url, &params).await
    }

    /// Full-text article search sorted by recency
    async fn search(&self, query: &str) -> Result<HeadlineList, FailureReason> {
        let url = format!("{}/everything", self.base_url);
        let params = [
            ("q", query),
            ("language", "en"),
            ("sortBy", "publishedAt"),
            ("pageSize", PAGE_SIZE),
        ];
        self.get(&url, &params).await
    }

    async fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<HeadlineList, FailureReason> {
        let response = self
            .client
            .get(url)
            .query(params)
            .query(&[("apiKey", &self.api_key)])
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "news request failed");
                super::reason_for_transport(&e)
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = %status, "news API error");
            return Err(super::reason_for_status(status));
        }

        let envelope: NewsEnvelope = response.json().await.map_err(|e| {
            tracing::warn!(error = %e, "failed to parse news response");
            FailureReason::Unreachable
        })?;

        if envelope.status != "ok" {
            return Err(FailureReason::Unreachable);
        }

        Ok(format_headlines(envelope))
    }
}

/// Convert the raw envelope into the typed list, dropping untitled articles
fn format_headlines(envelope: NewsEnvelope) -> HeadlineList {
    let articles = envelope
        .articles
        .into_iter()
        .filter_map(|raw| {
            let title = raw.title?;
            Some(Headline {
                title,
                description: raw.description,
                source: raw.source.name.unwrap_or_default(),
                published_at: raw.published_at.unwrap_or_default(),
                url: raw.url.unwrap_or_default(),
            })
        })
        .collect();

    HeadlineList {
        articles,
        total_results: envelope.total_results,
    }
}

#[async_trait]
impl NewsClient for NewsService {
    async fn fetch(&self, topic: Option<&str>) -> ServiceOutcome {
        if self.api_key.is_empty() {
            return ServiceOutcome::Failure(FailureReason::InvalidKey);
        }

        // A topic matching a known category uses the headlines endpoint;
        // anything else is a full-text search. No topic means top headlines.
        let result = match topic {
            None => self.top_headlines(None).await,
            Some(topic) if CATEGORIES.contains(&topic) => self.top_headlines(Some(topic)).await,
            Some(topic) => self.search(topic).await,
        };

        match result {
            Ok(list) if list.articles.is_empty() => {
                ServiceOutcome::Failure(FailureReason::NotFound)
            }
            Ok(list) => {
                tracing::debug!(count = list.articles.len(), "headlines fetched");
                ServiceOutcome::Success(Payload::Headlines(list))
            }
            Err(reason) => ServiceOutcome::Failure(reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_envelope() {
        let json = r#"{
            "status": "ok",
            "totalResults": 1,
            "articles": [{
                "title": "Example headline",
                "description": "Details",
                "url": "https://example.com/a",
                "publishedAt": "2025-01-01T00:00:00Z",
                "source": {"id": null, "name": "Example News"}
            }]
        }"#;
        let envelope: NewsEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.status, "ok");
        assert_eq!(envelope.total_results, 1);
        assert_eq!(envelope.articles.len(), 1);
    }

    #[test]
    fn untitled_articles_are_dropped() {
        let json = r#"{
            "status": "ok",
            "totalResults": 2,
            "articles": [
                {"title": null, "source": {"name": "A"}},
                {"title": "Kept", "source": {"name": "B"}}
            ]
        }"#;
        let envelope: NewsEnvelope = serde_json::from_str(json).unwrap();
        let list = format_headlines(envelope);
        assert_eq!(list.articles.len(), 1);
        assert_eq!(list.articles[0].title, "Kept");
        assert_eq!(list.total_results, 2);
    }

    #[tokio::test]
    async fn empty_key_fails_without_network() {
        let service = NewsService::new(String::new());
        let outcome = service.fetch(None).await;
        assert!(matches!(
            outcome,
            ServiceOutcome::Failure(FailureReason::InvalidKey)
        ));
    }
}
