use serde::Deserialize;

/// `xdp.*` section: the host NIC the ingress translator attaches to.
#[derive(Debug, Deserialize, Clone)]
pub struct XdpConfig {
    /// Host NIC name the ingress XDP program attaches to. Required.
    pub interface: String,
    #[serde(default = "default_rx_queues")]
    pub rx_queues: u32,
}

fn default_rx_queues() -> u32 {
    1
}
