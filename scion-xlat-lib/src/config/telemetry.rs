use serde::Deserialize;
use std::net::SocketAddr;

/// `telemetry.*` section: ambient Prometheus metrics exposure. Not a
/// feature the spec's Non-goals scope out - path-selection *policy* is
/// out of scope, observability is not (SPEC_FULL §A.7).
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self { enabled: default_enabled(), listen: default_listen() }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_listen() -> SocketAddr {
    "0.0.0.0:9000".parse().expect("valid default listen address")
}
