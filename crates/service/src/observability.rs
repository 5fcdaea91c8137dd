use once_cell::sync::Lazy;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec, IntCounter,
    IntCounterVec, TextEncoder,
};

// Prometheus metrics (default registry)
pub static RELAY_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "weather_relay_requests_total",
        "Total relay API requests by endpoint and response status",
        &["endpoint", "status"]
    )
    .expect("register relay_requests_total")
});

pub static UPSTREAM_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "weather_relay_upstream_requests_total",
        "Total outbound upstream attempts",
        &["upstream"]
    )
    .expect("register upstream_requests_total")
});

pub static UPSTREAM_ERRORS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    register_int_counter_vec!(
        "weather_relay_upstream_errors_total",
        "Total upstream calls that failed after retries",
        &["upstream", "kind"]
    )
    .expect("register upstream_errors_total")
});

pub static UPSTREAM_RETRIES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!("weather_relay_upstream_retries_total", "Total upstream retry attempts")
        .expect("register upstream_retries_total")
});

pub static UPSTREAM_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    register_histogram_vec!(
        "weather_relay_upstream_duration_seconds",
        "Upstream call duration in seconds, retries included",
        &["upstream"],
        vec![0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .expect("register upstream_duration")
});

/// Touch every metric so `/metrics` lists them before first use.
pub fn init() {
    Lazy::force(&RELAY_REQUESTS_TOTAL);
    Lazy::force(&UPSTREAM_REQUESTS_TOTAL);
    Lazy::force(&UPSTREAM_ERRORS_TOTAL);
    Lazy::force(&UPSTREAM_RETRIES_TOTAL);
    Lazy::force(&UPSTREAM_DURATION);
}

pub fn encode_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
