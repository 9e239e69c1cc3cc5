//! Inclusive IPv4 address ranges and numeric containment
//!
//! Addresses are compared as 32-bit integers built from their octets,
//! never as strings: `10.0.0.9` sorts below `10.0.0.10` here.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Convert a dotted-quad string into its 32-bit value.
///
/// Each octet becomes an 8-bit field, concatenated MSB-first. Anything other
/// than exactly four decimal octets in `0..=255` is rejected.
pub fn ipv4_to_u32(ip: &str) -> Result<u32> {
    let octets: Vec<&str> = ip.trim().split('.').collect();
    if octets.len() != 4 {
        return Err(Error::invalid_address(ip, "expected four octets"));
    }

    let mut value = 0u32;
    for octet in octets {
        if octet.is_empty() || !octet.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid_address(ip, "octets must be decimal"));
        }
        let field: u8 = octet
            .parse()
            .map_err(|_| Error::invalid_address(ip, "octet out of range"))?;
        value = (value << 8) | u32::from(field);
    }

    Ok(value)
}

/// Parse a dotted-quad string into an [`Ipv4Addr`] using [`ipv4_to_u32`]
pub fn parse_ipv4(ip: &str) -> Result<Ipv4Addr> {
    ipv4_to_u32(ip).map(Ipv4Addr::from)
}

/// Whether `ip` lies within `start..=end`, all given as dotted quads
pub fn ip_in_range(ip: &str, start: &str, end: &str) -> Result<bool> {
    let ip = ipv4_to_u32(ip)?;
    let start = ipv4_to_u32(start)?;
    let end = ipv4_to_u32(end)?;
    Ok(start <= ip && ip <= end)
}

/// Inclusive IPv4 range handed out by a DHCP server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange", into = "RawRange")]
pub struct SubnetRange {
    pub start: Ipv4Addr,
    pub end: Ipv4Addr,
}

impl SubnetRange {
    /// Create a range, rejecting `start > end`
    pub fn new(start: Ipv4Addr, end: Ipv4Addr) -> Result<Self> {
        if u32::from(start) > u32::from(end) {
            return Err(Error::invalid_address(
                format!("{}-{}", start, end),
                "range start is above range end",
            ));
        }
        Ok(Self { start, end })
    }

    /// Create a range from the dotted-quad strings a DHCP server reports
    pub fn parse(start: &str, end: &str) -> Result<Self> {
        Self::new(parse_ipv4(start)?, parse_ipv4(end)?)
    }

    /// Inclusive numeric containment
    pub fn contains(&self, ip: Ipv4Addr) -> bool {
        let ip = u32::from(ip);
        u32::from(self.start) <= ip && ip <= u32::from(self.end)
    }

    /// Containment for an address still in textual form
    pub fn contains_str(&self, ip: &str) -> Result<bool> {
        Ok(self.contains(parse_ipv4(ip)?))
    }
}

impl fmt::Display for SubnetRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

#[derive(Serialize, Deserialize)]
struct RawRange {
    start: String,
    end: String,
}

impl TryFrom<RawRange> for SubnetRange {
    type Error = Error;

    fn try_from(raw: RawRange) -> Result<Self> {
        SubnetRange::parse(&raw.start, &raw.end)
    }
}

impl From<SubnetRange> for RawRange {
    fn from(range: SubnetRange) -> Self {
        RawRange {
            start: range.start.to_string(),
            end: range.end.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ipv4_to_u32() {
        assert_eq!(ipv4_to_u32("0.0.0.0").unwrap(), 0);
        assert_eq!(ipv4_to_u32("255.255.255.255").unwrap(), u32::MAX);
        assert_eq!(ipv4_to_u32("10.0.0.1").unwrap(), 0x0A00_0001);
        assert_eq!(ipv4_to_u32("192.168.1.20").unwrap(), 0xC0A8_0114);
    }

    #[test]
    fn test_ipv4_to_u32_rejects_malformed() {
        for bad in [
            "10.0.0.256",
            "10.0.0",
            "10.0.0.1.1",
            "10.0.-1.1",
            "10.0.x.1",
            "",
            "10..0.1",
        ] {
            assert!(ipv4_to_u32(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn test_containment_is_numeric_not_lexicographic() {
        // "10.0.0.9" > "10.0.0.10" as strings
        assert!(ip_in_range("10.0.0.9", "10.0.0.2", "10.0.0.10").unwrap());
        assert!(!ip_in_range("10.0.0.100", "10.0.0.2", "10.0.0.20").unwrap());
    }

    #[test]
    fn test_containment_bounds_inclusive() {
        let triples = [
            ("10.0.0.10", "10.0.0.20"),
            ("0.0.0.0", "0.0.0.0"),
            ("172.16.0.1", "172.31.255.254"),
            ("255.255.255.0", "255.255.255.255"),
        ];
        for (start, end) in triples {
            assert!(ip_in_range(start, start, end).unwrap());
            assert!(ip_in_range(end, start, end).unwrap());
        }
    }

    #[test]
    fn test_containment_matches_numeric_comparison() {
        let samples = [
            "0.0.0.0",
            "9.255.255.255",
            "10.0.0.1",
            "10.0.0.15",
            "10.0.1.0",
            "100.64.0.5",
            "192.168.0.255",
            "255.255.255.255",
        ];
        for ip in samples {
            for start in samples {
                for end in samples {
                    let expected = u32::from(ip.parse::<Ipv4Addr>().unwrap())
                        >= u32::from(start.parse::<Ipv4Addr>().unwrap())
                        && u32::from(ip.parse::<Ipv4Addr>().unwrap())
                            <= u32::from(end.parse::<Ipv4Addr>().unwrap());
                    assert_eq!(ip_in_range(ip, start, end).unwrap(), expected);
                }
            }
        }
    }

    #[test]
    fn test_subnet_range_rejects_inverted() {
        assert!(SubnetRange::parse("10.0.0.20", "10.0.0.10").is_err());
    }

    #[test]
    fn test_subnet_range_contains() {
        let range = SubnetRange::parse("10.0.0.10", "10.0.0.20").unwrap();
        assert!(range.contains("10.0.0.10".parse().unwrap()));
        assert!(range.contains("10.0.0.20".parse().unwrap()));
        assert!(!range.contains("10.0.0.21".parse().unwrap()));
        assert!(range.contains_str("10.0.0.300").is_err());
        assert_eq!(range.to_string(), "10.0.0.10-10.0.0.20");
    }

    #[test]
    fn test_subnet_range_serde() {
        let range: SubnetRange =
            serde_json::from_str(r#"{"start": "10.10.10.2", "end": "10.10.10.99"}"#).unwrap();
        assert_eq!(range.start, Ipv4Addr::new(10, 10, 10, 2));
        assert_eq!(range.end, Ipv4Addr::new(10, 10, 10, 99));

        let bad = serde_json::from_str::<SubnetRange>(r#"{"start": "10.10.10", "end": "x"}"#);
        assert!(bad.is_err());
    }
}
