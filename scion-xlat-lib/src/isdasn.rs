//! `IsdAsn` human-readable parsing/emission (component A, SPEC_FULL §4.A).
//!
//! Wire layout and the bit-level accessors live in `scion_xlat_common`
//! (`no_std`, shared with the kernel programs); this module only adds
//! the `std`-dependent string grammar, following
//! `vpp-path-manager/scion/include/scion/addr/isd_asn.hpp`:
//! `Isd::Parse` is a plain decimal `u16`; `Asn::Parse` tries a decimal
//! `u64` (if it fits a BGP-compatible 32-bit AS) first, then falls back
//! to exactly three `:`-separated 1-4 digit hex groups.

use std::fmt;

use scion_xlat_common::{IsdAsnValue, MapKey};

use crate::error::{IsdAsnError, MapKeyError};

/// 48-bit `ISD-AS` identifier with string parse/emit. Thin wrapper over
/// `scion_xlat_common::IsdAsnValue`, which carries the wire-level bit
/// layout and is usable from `no_std` kernel code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsdAsn(pub IsdAsnValue);

/// Largest AS number expressible as a plain BGP-style decimal.
const BGP_ASN_MAX: u64 = u32::MAX as u64;

impl IsdAsn {
    pub const fn new(isd: u16, asn: u64) -> Self {
        Self(IsdAsnValue::new(isd, asn))
    }

    pub const fn isd(self) -> u16 {
        self.0.isd()
    }

    pub const fn asn(self) -> u64 {
        self.0.asn()
    }

    pub const fn is_unspecified(self) -> bool {
        self.0.is_unspecified()
    }

    /// `<decimal-isd>-<asn>`, where `asn` is decimal if it is
    /// BGP-compatible, or three `:`-separated 1-4-digit hex groups
    /// otherwise. The accepted grammar on parse is the union of both
    /// forms regardless of which one `to_string` would produce.
    pub fn parse(s: &str) -> Result<Self, IsdAsnError> {
        let (isd_str, asn_str) = s
            .split_once('-')
            .ok_or_else(|| IsdAsnError::InvalidArgument(s.to_string()))?;

        let isd_val: u64 = isd_str
            .parse()
            .map_err(|_| IsdAsnError::InvalidArgument(s.to_string()))?;
        if isd_val > u16::MAX as u64 {
            return Err(IsdAsnError::IsdOutOfRange(isd_val));
        }
        let isd = isd_val as u16;

        let asn = parse_asn(asn_str, s)?;

        Ok(Self::new(isd, asn))
    }

    pub const fn emit(bytes: [u8; 8]) -> Self {
        Self(IsdAsnValue::from_be_bytes(bytes))
    }

    pub const fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }

    /// Derive the 32-bit path-cache key (component B's `MapKey`),
    /// truncating the 48-bit AS to 20 bits. Fails rather than silently
    /// wrapping when the AS does not fit - see DESIGN.md Open Question
    /// OQ-1.
    pub fn to_map_key(self) -> Result<MapKey, MapKeyError> {
        let asn = self.asn();
        if asn > MapKey::AS_MASK as u64 {
            return Err(MapKeyError::AsnTooWide(asn));
        }
        Ok(MapKey::new(self.isd(), asn as u32))
    }

    /// Reconstruct an `IsdAsn` from a `MapKey` the way the path service
    /// does when it receives a missed key (SPEC_FULL §4.G step 1):
    /// `isd = key >> 20`, `as = key & 0xFFFFF`.
    pub fn from_map_key(key: MapKey) -> Self {
        Self::new(key.isd(), key.truncated_as() as u64)
    }
}

/// `asn_str` is the part of the original `full` string after the `-`;
/// `full` is kept around only to build `InvalidArgument`'s message.
fn parse_asn(asn_str: &str, full: &str) -> Result<u64, IsdAsnError> {
    if let Ok(decimal) = asn_str.parse::<u64>() {
        if decimal <= BGP_ASN_MAX {
            return Ok(decimal);
        }
    }
    parse_hex_groups(asn_str, full)
}

/// Three `:`-separated hex groups, each at most 16 bits (SPEC_FULL §4.A:
/// "any group > 2^16-1 is `OutOfRange`"). A group that isn't valid hex at
/// all (empty, or contains non-hex digits) is a malformed string, not an
/// out-of-range one.
fn parse_hex_groups(asn_str: &str, full: &str) -> Result<u64, IsdAsnError> {
    let groups: Vec<&str> = asn_str.split(':').collect();
    if groups.len() != 3 {
        return Err(IsdAsnError::InvalidArgument(full.to_string()));
    }
    let mut value: u64 = 0;
    for g in &groups {
        if g.is_empty() {
            return Err(IsdAsnError::InvalidArgument(full.to_string()));
        }
        let parsed = u64::from_str_radix(g, 16)
            .map_err(|_| IsdAsnError::InvalidArgument(full.to_string()))?;
        if parsed > u16::MAX as u64 {
            return Err(IsdAsnError::AsGroupOutOfRange(parsed));
        }
        value = (value << 16) | parsed;
    }
    Ok(value)
}

impl fmt::Display for IsdAsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let asn = self.asn();
        if asn <= BGP_ASN_MAX {
            write!(f, "{}-{}", self.isd(), asn)
        } else {
            write!(
                f,
                "{}-{:x}:{:x}:{:x}",
                self.isd(),
                (asn >> 32) & 0xFFFF,
                (asn >> 16) & 0xFFFF,
                asn & 0xFFFF
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_group_asn() {
        let ia = IsdAsn::parse("1-ff00:0:110").unwrap();
        assert_eq!(ia.isd(), 1);
        assert_eq!(ia.asn(), 0xff00_0000_0110);
        assert_eq!(ia.0 .0, (1u64 << 48) | 0xff00_0000_0110);
    }

    #[test]
    fn parses_decimal_asn() {
        let ia = IsdAsn::parse("1-65000").unwrap();
        assert_eq!(ia.isd(), 1);
        assert_eq!(ia.asn(), 65000);
    }

    #[test]
    fn rejects_malformed_string() {
        assert!(matches!(
            IsdAsn::parse("not-an-isd-asn-at-all"),
            Err(IsdAsnError::InvalidArgument(_))
        ));
        assert!(matches!(
            IsdAsn::parse("abc-123"),
            Err(IsdAsnError::InvalidArgument(_))
        ));
    }

    #[test]
    fn rejects_isd_out_of_range() {
        assert!(matches!(
            IsdAsn::parse("70000-1"),
            Err(IsdAsnError::IsdOutOfRange(_))
        ));
    }

    #[test]
    fn rejects_hex_group_out_of_range() {
        assert!(matches!(
            IsdAsn::parse("1-10000:0:0"),
            Err(IsdAsnError::AsGroupOutOfRange(0x10000))
        ));
    }

    #[test]
    fn rejects_wrong_hex_group_count() {
        assert!(IsdAsn::parse("1-ff00:0").is_err());
        assert!(IsdAsn::parse("1-ff00:0:0:0").is_err());
    }

    #[test]
    fn parse_emit_roundtrip() {
        let ia = IsdAsn::new(1, 0xff00_0000_0110);
        let bytes = ia.to_be_bytes();
        assert_eq!(IsdAsn::emit(bytes), ia);
    }

    #[test]
    fn display_roundtrips_through_parse() {
        let ia = IsdAsn::new(1, 0xff00_0000_0110);
        let s = ia.to_string();
        assert_eq!(IsdAsn::parse(&s).unwrap(), ia);

        let bgp = IsdAsn::new(2, 65000);
        assert_eq!(bgp.to_string(), "2-65000");
    }

    #[test]
    fn map_key_roundtrip_for_narrow_as() {
        let ia = IsdAsn::new(1, 0x10);
        let key = ia.to_map_key().unwrap();
        assert_eq!(IsdAsn::from_map_key(key).isd(), 1);
        assert_eq!(IsdAsn::from_map_key(key).asn(), 0x10);
    }

    #[test]
    fn map_key_rejects_wide_as() {
        let ia = IsdAsn::new(1, 0xff00_0000_0110);
        assert!(matches!(ia.to_map_key(), Err(MapKeyError::AsnTooWide(_))));
    }
}
