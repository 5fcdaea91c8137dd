//! Upstream layer of the relay.
//! - One client per third-party API (weather, photo, quote), sharing a pooled `reqwest::Client`.
//! - Typed response schemas; upstream fields outside them never reach callers.
//! - Bounded retry for transient failures and Prometheus counters for every call.

pub mod errors;
pub mod http;
pub mod observability;
pub mod photo;
pub mod quote;
pub mod retry;
pub mod weather;

use configs::RelayConfig;

pub use errors::UpstreamError;
pub use photo::{BackgroundImage, PhotoClient};
pub use quote::{Quote, QuoteClient};
pub use retry::RetryPolicy;
pub use weather::{WeatherClient, WeatherReport};

/// The three upstream clients, built once from config.
#[derive(Clone)]
pub struct UpstreamClients {
    pub weather: WeatherClient,
    pub photo: PhotoClient,
    pub quote: QuoteClient,
}

impl UpstreamClients {
    pub fn from_config(cfg: &RelayConfig) -> Result<Self, UpstreamError> {
        let http = http::build_client(&cfg.upstream)?;
        let retry = RetryPolicy::from_config(&cfg.retry);
        let creds = &cfg.credentials;
        let up = &cfg.upstream;

        Ok(Self {
            weather: WeatherClient::new(
                http.clone(),
                up.weather_base_url.as_str(),
                creds.weather_api_key.as_str(),
                retry.clone(),
            ),
            photo: PhotoClient::new(
                http.clone(),
                up.photo_base_url.as_str(),
                creds.photo_api_key.as_str(),
                retry.clone(),
            ),
            quote: QuoteClient::new(
                http,
                up.quote_base_url.as_str(),
                up.quote_host.as_str(),
                creds.quote_api_key.clone(),
                retry,
            ),
        })
    }
}
