use serde::Deserialize;
use serde::Serialize;

use crate::Error;
use crate::Result;

/// Where the node exposes its request and watch counters for scraping.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonitoringConfig {
    #[serde(default = "default_prometheus_enabled")]
    pub prometheus_enabled: bool,

    /// Port of the separate `/metrics` listener, never the KV API port
    #[serde(default = "default_prometheus_port")]
    pub prometheus_port: u16,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            prometheus_enabled: default_prometheus_enabled(),
            prometheus_port: default_prometheus_port(),
        }
    }
}

impl MonitoringConfig {
    /// Checks the metrics listener against the KV API's own port.
    ///
    /// A disabled exporter accepts any port.
    pub fn validate(
        &self,
        api_port: u16,
    ) -> Result<()> {
        if !self.prometheus_enabled {
            return Ok(());
        }
        match self.prometheus_port {
            0 => Err(Error::InvalidConfig(
                "monitoring.prometheus_port must be set when the metrics exporter is enabled".into(),
            )),
            port if port == api_port => Err(Error::InvalidConfig(format!(
                "monitoring.prometheus_port {port} collides with the KV API listener"
            ))),
            port if port < 1024 => Err(Error::InvalidConfig(format!(
                "monitoring.prometheus_port {port} is privileged; pick a port >= 1024"
            ))),
            _ => Ok(()),
        }
    }
}

fn default_prometheus_enabled() -> bool {
    false
}

fn default_prometheus_port() -> u16 {
    9100
}
