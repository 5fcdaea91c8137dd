use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::UpstreamError;
use crate::http::{get_json, join_url};
use crate::retry::RetryPolicy;

pub const UPSTREAM: &str = "quote";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RapidQuote {
    content: String,
    #[serde(default)]
    originator: Option<Originator>,
}

#[derive(Debug, Deserialize)]
struct Originator {
    name: String,
}

/// RapidAPI quotes client. Holds no key when the relay runs without one.
#[derive(Clone)]
pub struct QuoteClient {
    http: Client,
    base_url: String,
    host: String,
    api_key: Option<String>,
    retry: RetryPolicy,
}

impl QuoteClient {
    pub fn new(
        http: Client,
        base_url: impl Into<String>,
        host: impl Into<String>,
        api_key: Option<String>,
        retry: RetryPolicy,
    ) -> Self {
        Self { http, base_url: base_url.into(), host: host.into(), api_key, retry }
    }

    pub async fn random(&self) -> Result<Quote, UpstreamError> {
        let key = self.api_key.as_deref().ok_or(UpstreamError::NotConfigured)?;
        let url = join_url(&self.base_url, "/quotes/random/");
        let quote: RapidQuote = get_json(UPSTREAM, &self.retry, || {
            self.http
                .get(&url)
                .query(&[("language_code", "en")])
                .header("x-rapidapi-host", self.host.as_str())
                .header("x-rapidapi-key", key)
        })
        .await?;
        Ok(Quote { content: quote.content, author: quote.originator.map(|o| o.name) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_fails_without_calling_out() {
        let client = QuoteClient::new(
            Client::new(),
            "http://127.0.0.1:1",
            "quotes.test",
            None,
            RetryPolicy::disabled(),
        );
        assert!(matches!(client.random().await, Err(UpstreamError::NotConfigured)));
    }

    #[test]
    fn maps_originator_to_author() {
        let q: RapidQuote = serde_json::from_str(
            r#"{"id":1,"content":"Stay hungry.","originator":{"id":2,"name":"Steve Jobs"},"tags":[]}"#,
        )
        .expect("decode");
        assert_eq!(q.content, "Stay hungry.");
        assert_eq!(q.originator.map(|o| o.name).as_deref(), Some("Steve Jobs"));
    }
}
