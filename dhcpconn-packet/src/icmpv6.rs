//! ICMPv6 Neighbor Discovery decoding (RFC 4861)

use dhcpconn_core::MacAddr;
use std::net::Ipv6Addr;

/// ICMPv6 ND Message Types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum NdType {
    RouterSolicitation = 133,
    RouterAdvertisement = 134,
    NeighborSolicitation = 135,
    NeighborAdvertisement = 136,
    Redirect = 137,
}

impl NdType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            133 => Some(Self::RouterSolicitation),
            134 => Some(Self::RouterAdvertisement),
            135 => Some(Self::NeighborSolicitation),
            136 => Some(Self::NeighborAdvertisement),
            137 => Some(Self::Redirect),
            _ => None,
        }
    }
}

/// Source link-layer address option type
pub const OPTION_SOURCE_LL_ADDR: u8 = 1;

/// ICMPv6 message header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Icmpv6Header<'a> {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    /// Message body after the 4-byte header
    pub body: &'a [u8],
}

impl<'a> Icmpv6Header<'a> {
    pub const SIZE: usize = 4;

    pub fn from_bytes(data: &'a [u8]) -> Option<Self> {
        if data.len() < Self::SIZE {
            return None;
        }
        Some(Self {
            icmp_type: data[0],
            code: data[1],
            checksum: u16::from_be_bytes([data[2], data[3]]),
            body: &data[Self::SIZE..],
        })
    }

    pub fn nd_type(&self) -> Option<NdType> {
        NdType::from_u8(self.icmp_type)
    }
}

/// Neighbor Solicitation message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborSolicitation {
    /// Address whose link-layer address is being resolved
    pub target: Ipv6Addr,
    /// Source link-layer address option, if present
    pub source_ll_addr: Option<MacAddr>,
}

impl NeighborSolicitation {
    /// Reserved (4) + target (16)
    pub const MIN_BODY_SIZE: usize = 20;

    /// Decode a full ICMPv6 message; `None` unless it is a well-formed NS
    pub fn from_icmpv6(data: &[u8]) -> Option<Self> {
        let header = Icmpv6Header::from_bytes(data)?;
        if header.nd_type() != Some(NdType::NeighborSolicitation) || header.code != 0 {
            return None;
        }
        Self::from_body(header.body)
    }

    fn from_body(body: &[u8]) -> Option<Self> {
        if body.len() < Self::MIN_BODY_SIZE {
            return None;
        }
        let octets: [u8; 16] = body[4..20].try_into().ok()?;
        let target = Ipv6Addr::from(octets);

        let mut source_ll_addr = None;
        let mut options = &body[Self::MIN_BODY_SIZE..];
        while options.len() >= 2 {
            // Length is in units of 8 octets; zero is invalid and ends parsing
            let length = options[1] as usize * 8;
            if length == 0 || length > options.len() {
                break;
            }
            if options[0] == OPTION_SOURCE_LL_ADDR {
                source_ll_addr = MacAddr::from_slice(&options[2..length.min(8)]);
            }
            options = &options[length..];
        }

        Some(Self {
            target,
            source_ll_addr,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns_bytes(target: Ipv6Addr, sll: Option<[u8; 6]>) -> Vec<u8> {
        let mut data = vec![135, 0, 0, 0, 0, 0, 0, 0];
        data.extend_from_slice(&target.octets());
        if let Some(mac) = sll {
            data.extend_from_slice(&[OPTION_SOURCE_LL_ADDR, 1]);
            data.extend_from_slice(&mac);
        }
        data
    }

    #[test]
    fn test_nd_type_conversion() {
        assert_eq!(NdType::from_u8(135), Some(NdType::NeighborSolicitation));
        assert_eq!(NdType::from_u8(128), None);
    }

    #[test]
    fn test_parse_neighbor_solicitation() {
        let target: Ipv6Addr = "fd10:77be:4186::42".parse().unwrap();
        let data = ns_bytes(target, Some([0x02, 0, 0, 0, 0, 0x01]));
        let ns = NeighborSolicitation::from_icmpv6(&data).unwrap();

        assert_eq!(ns.target, target);
        assert_eq!(ns.source_ll_addr, Some(MacAddr::new([0x02, 0, 0, 0, 0, 0x01])));
    }

    #[test]
    fn test_parse_dad_without_options() {
        let target: Ipv6Addr = "fe80::1".parse().unwrap();
        let ns = NeighborSolicitation::from_icmpv6(&ns_bytes(target, None)).unwrap();
        assert_eq!(ns.target, target);
        assert!(ns.source_ll_addr.is_none());
    }

    #[test]
    fn test_rejects_other_types() {
        let mut data = ns_bytes(Ipv6Addr::LOCALHOST, None);
        data[0] = 136;
        assert!(NeighborSolicitation::from_icmpv6(&data).is_none());
    }

    #[test]
    fn test_rejects_truncated() {
        let data = ns_bytes(Ipv6Addr::LOCALHOST, None);
        assert!(NeighborSolicitation::from_icmpv6(&data[..12]).is_none());
    }
}
