use serde::Deserialize;

/// `tap.*` section: the TAP interface the host stack sees.
#[derive(Debug, Deserialize, Clone)]
pub struct TapConfig {
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for TapConfig {
    fn default() -> Self {
        Self { name: default_name() }
    }
}

fn default_name() -> String {
    "scion".to_string()
}
