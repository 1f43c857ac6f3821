//! Serving configuration: the listen address plus the cache lifetimes of the
//! aggregator answering requests.

use crate::aggregate::{Aggregator, AggregatorConfig, SharedAggregator};
use crate::error::{Result, SystemError};
use crate::metrics::traits::MetricsProvider;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub struct WebConfig {
    /// Interface address, IPv4 or IPv6 literal
    pub host: String,
    pub port: u16,
    /// Send permissive CORS headers so browser dashboards on other origins can poll
    pub enable_cors: bool,
    /// TTLs for the server's aggregator
    pub aggregator: AggregatorConfig,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self::new("0.0.0.0", crate::DEFAULT_WEB_PORT)
    }
}

impl WebConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            enable_cors: true,
            aggregator: AggregatorConfig::default(),
        }
    }

    pub fn with_cors(mut self, enable_cors: bool) -> Self {
        self.enable_cors = enable_cors;
        self
    }

    /// Replace the cache lifetimes used by [`WebConfig::build_aggregator`].
    pub fn with_aggregator(mut self, aggregator: AggregatorConfig) -> Self {
        self.aggregator = aggregator;
        self
    }

    /// Resolve the listen address. Host names are rejected; only IP literals bind.
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip = self.host.parse::<IpAddr>().map_err(|e| {
            SystemError::config_error(format!("Invalid bind host '{}': {}", self.host, e))
        })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    /// The shared aggregator every request of this server runs its pass on.
    pub fn build_aggregator(&self, provider: Arc<dyn MetricsProvider>) -> SharedAggregator {
        Aggregator::new(provider, self.aggregator.clone()).into_shared()
    }
}
