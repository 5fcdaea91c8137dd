//! Shared outbound HTTP plumbing for the upstream clients.

use configs::UpstreamConfig;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::UpstreamError;
use crate::observability::{UPSTREAM_DURATION, UPSTREAM_ERRORS_TOTAL, UPSTREAM_REQUESTS_TOTAL};
use crate::retry::{retry_with_policy, RetryPolicy};

/// One pooled client for all upstreams, with explicit timeouts.
pub fn build_client(cfg: &UpstreamConfig) -> Result<Client, UpstreamError> {
    let client = Client::builder()
        .connect_timeout(cfg.connect_timeout())
        .timeout(cfg.request_timeout())
        .user_agent(concat!("weather-relay/", env!("CARGO_PKG_VERSION")))
        .build()?;
    Ok(client)
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}

/// Send the request built by `build` (rebuilt on every attempt) and decode a
/// JSON body. A 404 maps to `NotFound`, other non-2xx to `Status`.
pub(crate) async fn get_json<T, B>(upstream: &'static str, policy: &RetryPolicy, build: B) -> Result<T, UpstreamError>
where
    T: DeserializeOwned,
    B: Fn() -> RequestBuilder,
{
    let timer = UPSTREAM_DURATION.with_label_values(&[upstream]).start_timer();
    let result = retry_with_policy(policy, || attempt::<T, B>(upstream, &build)).await;

    timer.observe_duration();
    if let Err(e) = &result {
        UPSTREAM_ERRORS_TOTAL.with_label_values(&[upstream, e.kind()]).inc();
    }
    result
}

async fn attempt<T, B>(upstream: &'static str, build: &B) -> Result<T, UpstreamError>
where
    T: DeserializeOwned,
    B: Fn() -> RequestBuilder,
{
    UPSTREAM_REQUESTS_TOTAL.with_label_values(&[upstream]).inc();
    let res = build().send().await?;
    let status = res.status();
    debug!(upstream, %status, "upstream responded");

    if status == StatusCode::NOT_FOUND {
        return Err(UpstreamError::NotFound);
    }
    let body = res.text().await?;
    if !status.is_success() {
        return Err(UpstreamError::Status { status, body: truncate_body(&body) });
    }
    serde_json::from_str(&body).map_err(|e| UpstreamError::Decode(e.to_string()))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        let head: String = body.chars().take(MAX).collect();
        format!("{head}...")
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(join_url("http://a.test/", "/x"), "http://a.test/x");
        assert_eq!(join_url("http://a.test", "/x"), "http://a.test/x");
    }

    #[test]
    fn truncate_body_is_char_safe() {
        let long = "é".repeat(300);
        let out = truncate_body(&long);
        assert!(out.ends_with("..."));
        assert_eq!(out.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
