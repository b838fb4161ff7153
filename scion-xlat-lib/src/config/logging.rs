use serde::Deserialize;

/// `log.*` section.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    /// Include the tracing target (module path) in formatted output.
    /// Default: false, matching the teacher's `fmt().with_target(false)`.
    #[serde(default)]
    pub show_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_level(), show_target: false }
    }
}

fn default_level() -> String {
    "info".to_string()
}
