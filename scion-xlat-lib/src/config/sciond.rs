use serde::Deserialize;

use scion_xlat_common::proto::DEFAULT_SCIOND_PORT;

/// `sciond.*` section: the SCION daemon control-plane RPC endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct SciondConfig {
    #[serde(default = "default_address")]
    pub address: String,
}

impl Default for SciondConfig {
    fn default() -> Self {
        Self { address: default_address() }
    }
}

fn default_address() -> String {
    format!("127.0.0.1:{DEFAULT_SCIOND_PORT}")
}
