use std::sync::Arc;

use configs::RelayConfig;
use service::{UpstreamClients, UpstreamError};

/// Shared, read-only handler state. Built once per process.
#[derive(Clone)]
pub struct AppState {
    pub upstreams: Arc<UpstreamClients>,
}

impl AppState {
    pub fn from_config(config: &RelayConfig) -> Result<Self, UpstreamError> {
        let upstreams = UpstreamClients::from_config(config)?;
        Ok(Self { upstreams: Arc::new(upstreams) })
    }
}
