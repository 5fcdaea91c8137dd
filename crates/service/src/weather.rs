use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Number;

use crate::errors::UpstreamError;
use crate::http::{get_json, join_url};
use crate::retry::RetryPolicy;

pub const UPSTREAM: &str = "weather";

/// Current conditions as returned to the client. Only these fields of the
/// upstream payload are kept; numbers keep the upstream's encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub name: String,
    pub main: MainReadings,
    /// Never empty once returned by [`WeatherClient::current`].
    pub weather: Vec<Condition>,
    pub wind: Wind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feels_like: Option<Number>,
    pub humidity: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: Number,
}

/// OpenWeather current-conditions client (metric units).
#[derive(Clone)]
pub struct WeatherClient {
    http: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl WeatherClient {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: impl Into<String>, retry: RetryPolicy) -> Self {
        Self { http, base_url: base_url.into(), api_key: api_key.into(), retry }
    }

    pub async fn current(&self, city: &str) -> Result<WeatherReport, UpstreamError> {
        let url = join_url(&self.base_url, "/data/2.5/weather");
        let report: WeatherReport = get_json(UPSTREAM, &self.retry, || {
            self.http
                .get(&url)
                .query(&[("q", city), ("units", "metric"), ("appid", self.api_key.as_str())])
        })
        .await?;
        if report.weather.is_empty() {
            return Err(UpstreamError::Decode("weather conditions list is empty".into()));
        }
        Ok(report)
    }
}
