use serde::Deserialize;

use super::logging::LoggingConfig;
use super::sciond::SciondConfig;
use super::tap::TapConfig;
use super::telemetry::TelemetryConfig;
use super::translator::TranslatorConfig;
use super::xdp::XdpConfig;

/// Root TOML configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default, rename = "log")]
    pub log: LoggingConfig,
    pub translator: TranslatorConfig,
    #[serde(default)]
    pub sciond: SciondConfig,
    #[serde(default)]
    pub tap: TapConfig,
    pub xdp: XdpConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}
