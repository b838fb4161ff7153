use std::fs;
use std::path::Path;

use crate::config::{validate, Config};
use crate::error::ConfigError;

pub fn load_from_path<P: AsRef<Path>>(p: P) -> Result<Config, ConfigError> {
    let path = p.as_ref();
    let txt = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    let cfg: Config = toml::from_str(&txt).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source: Box::new(source),
    })?;

    validate(&cfg)?;

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_minimal_valid_config() {
        let file = write_config(
            r#"
            [translator]
            isd_asn = "1-ff00:0:110"
            gateway_addr = "fc00:1::/64"
            host_addr = "fc00:2::/64"

            [xdp]
            interface = "eth0"
            "#,
        );
        let cfg = load_from_path(file.path()).unwrap();
        assert_eq!(cfg.translator.isd_asn.isd(), 1);
        assert_eq!(cfg.sciond.address, "127.0.0.1:30255");
        assert_eq!(cfg.tap.name, "scion");
        assert_eq!(cfg.xdp.rx_queues, 1);
    }

    #[test]
    fn rejects_missing_file() {
        assert!(load_from_path("/nonexistent/path/config.toml").is_err());
    }

    #[test]
    fn rejects_malformed_toml() {
        let file = write_config("this is not valid toml {{{");
        assert!(load_from_path(file.path()).is_err());
    }

    #[test]
    fn rejects_one_sided_ipv4_addrs() {
        let file = write_config(
            r#"
            [translator]
            isd_asn = "1-ff00:0:110"
            gateway_addr = "fc00:1::/64"
            host_addr = "fc00:2::/64"
            gateway_addr4 = "10.0.0.0/24"

            [xdp]
            interface = "eth0"
            "#,
        );
        assert!(load_from_path(file.path()).is_err());
    }
}
