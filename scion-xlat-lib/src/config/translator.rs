use std::fmt;

use ipnet::{Ipv4Net, Ipv6Net};
use serde::{de, Deserialize, Deserializer};

use crate::isdasn::IsdAsn;

/// `translator.*` section: local identity and the two address families
/// the translator straddles (SPEC_FULL §6).
#[derive(Debug, Deserialize, Clone)]
pub struct TranslatorConfig {
    /// Local `ISD-AS`, e.g. `"1-ff00:0:110"`. Required.
    #[serde(deserialize_with = "deserialize_isd_asn")]
    pub isd_asn: IsdAsn,
    /// Local IPv6 network of the gateway (the SCION-facing side).
    pub gateway_addr: Ipv6Net,
    /// Local IPv6 network of the host (the legacy-IPv6-facing side).
    pub host_addr: Ipv6Net,
    /// Optional IPv4 gateway network. Must be set together with
    /// `host_addr4` or not at all.
    #[serde(default)]
    pub gateway_addr4: Option<Ipv4Net>,
    /// Optional IPv4 host network. Must be set together with
    /// `gateway_addr4` or not at all.
    #[serde(default)]
    pub host_addr4: Option<Ipv4Net>,
}

fn deserialize_isd_asn<'de, D>(deserializer: D) -> Result<IsdAsn, D::Error>
where
    D: Deserializer<'de>,
{
    struct IsdAsnVisitor;

    impl de::Visitor<'_> for IsdAsnVisitor {
        type Value = IsdAsn;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an ISD-AS string, e.g. \"1-ff00:0:110\"")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<IsdAsn, E> {
            IsdAsn::parse(v).map_err(de::Error::custom)
        }
    }

    deserializer.deserialize_str(IsdAsnVisitor)
}
