use crate::config::Config;
use crate::error::ConfigError;

/// SPEC_FULL §A.4: required fields plus the `gateway_addr4`/`host_addr4`
/// "both or neither" invariant confirmed by `original_source`'s
/// `TranslatorConfig` (both are `std::optional` there).
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.translator.isd_asn.is_unspecified() {
        return Err(ConfigError::Invalid {
            field: "translator.isd_asn",
            reason: "ISD and AS must both be non-zero".to_string(),
        });
    }

    match (&config.translator.gateway_addr4, &config.translator.host_addr4) {
        (Some(_), Some(_)) | (None, None) => {}
        _ => {
            return Err(ConfigError::Invalid {
                field: "translator.gateway_addr4/host_addr4",
                reason: "must both be set or both be absent".to_string(),
            })
        }
    }

    if config.xdp.interface.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "xdp.interface",
            reason: "must not be empty".to_string(),
        });
    }

    if config.xdp.rx_queues == 0 {
        return Err(ConfigError::Invalid {
            field: "xdp.rx_queues",
            reason: "must be at least 1".to_string(),
        });
    }

    if config.sciond.address.trim().is_empty() {
        return Err(ConfigError::Invalid {
            field: "sciond.address",
            reason: "must not be empty".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{LoggingConfig, SciondConfig, TapConfig, TelemetryConfig, TranslatorConfig, XdpConfig};
    use crate::isdasn::IsdAsn;

    fn base_config() -> Config {
        Config {
            log: LoggingConfig::default(),
            translator: TranslatorConfig {
                isd_asn: IsdAsn::new(1, 10),
                gateway_addr: "fc00:1::/64".parse().unwrap(),
                host_addr: "fc00:2::/64".parse().unwrap(),
                gateway_addr4: None,
                host_addr4: None,
            },
            sciond: SciondConfig::default(),
            tap: TapConfig::default(),
            xdp: XdpConfig { interface: "eth0".to_string(), rx_queues: 1 },
            telemetry: TelemetryConfig::default(),
        }
    }

    #[test]
    fn accepts_valid_config() {
        assert!(validate(&base_config()).is_ok());
    }

    #[test]
    fn rejects_unspecified_isd_asn() {
        let mut cfg = base_config();
        cfg.translator.isd_asn = IsdAsn::new(0, 0);
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn rejects_empty_interface() {
        let mut cfg = base_config();
        cfg.xdp.interface = String::new();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn rejects_lopsided_ipv4_config() {
        let mut cfg = base_config();
        cfg.translator.gateway_addr4 = Some("10.0.0.0/24".parse().unwrap());
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn accepts_both_ipv4_addrs_present() {
        let mut cfg = base_config();
        cfg.translator.gateway_addr4 = Some("10.0.0.0/24".parse().unwrap());
        cfg.translator.host_addr4 = Some("10.0.1.0/24".parse().unwrap());
        assert!(validate(&cfg).is_ok());
    }
}
