//! Relay configuration.
//!
//! Built once at startup from built-in defaults, an optional TOML file and
//! the process environment (in that order of precedence, lowest first).
//! Upstream credentials are only ever read from the environment.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

pub const WEATHER_KEY_VAR: &str = "OPENWEATHER_API_KEY";
pub const PHOTO_KEY_VAR: &str = "UNSPLASH_API_KEY";
pub const QUOTE_KEY_VAR: &str = "QUOTES_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not defined in the environment variables")]
    MissingCredential(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("cannot parse config file: {0}")]
    Parse(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RelayConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(skip)]
    pub credentials: Credentials,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 5000, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    pub weather_base_url: String,
    pub photo_base_url: String,
    pub quote_base_url: String,
    /// Sent as `x-rapidapi-host`.
    pub quote_host: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            weather_base_url: "https://api.openweathermap.org".into(),
            photo_base_url: "https://api.unsplash.com".into(),
            quote_base_url: "https://quotes15.p.rapidapi.com".into(),
            quote_host: "quotes15.p.rapidapi.com".into(),
            connect_timeout_secs: 5,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub enabled: bool,
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
    pub backoff_max_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self { enabled: true, max_attempts: 2, backoff_base_ms: 200, backoff_max_ms: 2000 }
    }
}

#[derive(Clone, Default)]
pub struct Credentials {
    pub weather_api_key: String,
    pub photo_api_key: String,
    pub quote_api_key: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn mask(v: &str) -> &'static str {
            if v.is_empty() { "<unset>" } else { "<redacted>" }
        }
        f.debug_struct("Credentials")
            .field("weather_api_key", &mask(&self.weather_api_key))
            .field("photo_api_key", &mask(&self.photo_api_key))
            .field("quote_api_key", &self.quote_api_key.as_deref().map(mask))
            .finish()
    }
}

/// Load using `$CONFIG_PATH` (default `config.toml`) and the process environment.
pub fn load_default() -> Result<RelayConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_with(Path::new(&path), |key| std::env::var(key).ok())
}

/// Load from `path` and overlay values returned by `lookup`, then validate.
pub fn load_with<F>(path: &Path, lookup: F) -> Result<RelayConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cfg = load_from_file(path)?;
    cfg.apply_env(lookup)?;
    cfg.normalize_and_validate()?;
    Ok(cfg)
}

/// A missing file yields the defaults; a malformed one is an error.
pub fn load_from_file(path: &Path) -> Result<RelayConfig> {
    if !path.exists() {
        return Ok(RelayConfig::default());
    }
    let content = std::fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse(format!("{}: {e}", path.display())))
}

fn parse_var<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key} has an invalid value: {raw:?}")))
}

fn non_blank(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

impl RelayConfig {
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("PORT") {
            self.server.port = parse_var("PORT", &port)?;
        }
        if let Some(w) = lookup("TOKIO_WORKER_THREADS") {
            self.server.worker_threads = Some(parse_var("TOKIO_WORKER_THREADS", &w)?);
        }
        if let Some(url) = lookup("WEATHER_API_BASE_URL") {
            self.upstream.weather_base_url = url;
        }
        if let Some(url) = lookup("PHOTO_API_BASE_URL") {
            self.upstream.photo_base_url = url;
        }
        if let Some(url) = lookup("QUOTE_API_BASE_URL") {
            self.upstream.quote_base_url = url;
        }
        if let Some(s) = lookup("UPSTREAM_CONNECT_TIMEOUT_SECS") {
            self.upstream.connect_timeout_secs = parse_var("UPSTREAM_CONNECT_TIMEOUT_SECS", &s)?;
        }
        if let Some(s) = lookup("UPSTREAM_REQUEST_TIMEOUT_SECS") {
            self.upstream.request_timeout_secs = parse_var("UPSTREAM_REQUEST_TIMEOUT_SECS", &s)?;
        }
        if let Some(s) = lookup("UPSTREAM_RETRY_ENABLED") {
            self.retry.enabled = parse_var("UPSTREAM_RETRY_ENABLED", &s)?;
        }

        self.credentials = Credentials {
            weather_api_key: non_blank(lookup(WEATHER_KEY_VAR))
                .ok_or(ConfigError::MissingCredential(WEATHER_KEY_VAR))?,
            photo_api_key: non_blank(lookup(PHOTO_KEY_VAR))
                .ok_or(ConfigError::MissingCredential(PHOTO_KEY_VAR))?,
            quote_api_key: non_blank(lookup(QUOTE_KEY_VAR)),
        };
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.upstream.validate()?;
        self.retry.validate()?;
        self.credentials.validate()?;
        Ok(())
    }

    /// `server.host` must be an IPv4 or IPv6 literal.
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let host = self.server.host.trim();
        let ip: IpAddr = host
            .trim_start_matches('[')
            .trim_end_matches(']')
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("server.host {host:?} is not an IP address: {e}")))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = ServerConfig::default().host;
        }
        if self.port == 0 {
            return Err(ConfigError::Invalid("server.port must be within 1..=65535".into()));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl UpstreamConfig {
    fn validate(&self) -> Result<()> {
        for (name, url) in [
            ("upstream.weather_base_url", &self.weather_base_url),
            ("upstream.photo_base_url", &self.photo_base_url),
            ("upstream.quote_base_url", &self.quote_base_url),
        ] {
            let lower = url.to_lowercase();
            if !(lower.starts_with("http://") || lower.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!("{name} must start with http:// or https://")));
            }
        }
        if self.connect_timeout_secs == 0 || self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("upstream timeouts must be positive seconds".into()));
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl RetryConfig {
    fn validate(&self) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be >= 1".into()));
        }
        Ok(())
    }

    pub fn backoff_base(&self) -> Duration {
        Duration::from_millis(self.backoff_base_ms)
    }

    pub fn backoff_max(&self) -> Duration {
        Duration::from_millis(self.backoff_max_ms)
    }
}

impl Credentials {
    fn validate(&self) -> Result<()> {
        if self.weather_api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential(WEATHER_KEY_VAR));
        }
        if self.photo_api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential(PHOTO_KEY_VAR));
        }
        Ok(())
    }
}
