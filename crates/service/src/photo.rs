use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::errors::UpstreamError;
use crate::http::{get_json, join_url};
use crate::retry::RetryPolicy;

pub const UPSTREAM: &str = "photo";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackgroundImage {
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct UnsplashPhoto {
    urls: UnsplashUrls,
}

#[derive(Debug, Deserialize)]
struct UnsplashUrls {
    regular: String,
}

/// Unsplash random-photo search client.
#[derive(Clone)]
pub struct PhotoClient {
    http: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl PhotoClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>, retry: RetryPolicy) -> Self {
        Self { http, base_url: base_url.into(), api_key: api_key.into(), retry }
    }

    /// Regular-resolution URL of a random photo matching `query`.
    pub async fn random_for(&self, query: &str) -> Result<BackgroundImage, UpstreamError> {
        let url = join_url(&self.base_url, "/photos/random");
        let photo: UnsplashPhoto = get_json(UPSTREAM, &self.retry, || {
            self.http
                .get(&url)
                .query(&[("query", query), ("client_id", self.api_key.as_str())])
        })
        .await?;
        Ok(BackgroundImage { url: photo.urls.regular })
    }
}
