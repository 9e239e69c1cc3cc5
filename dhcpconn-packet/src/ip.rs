//! IPv4 and IPv6 header parsing

use std::net::{Ipv4Addr, Ipv6Addr};

/// IPv4 packet view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Packet<'a> {
    pub source: Ipv4Addr,
    pub destination: Ipv4Addr,
    /// Protocol number of the payload
    pub protocol: u8,
    /// Header length in bytes (IHL * 4)
    pub header_len: usize,
    pub payload: &'a [u8],
}

impl<'a> Ipv4Packet<'a> {
    /// Minimum IPv4 header size
    pub const MIN_HEADER_SIZE: usize = 20;

    /// Parse an IPv4 packet from bytes
    ///
    /// The payload is cut at the header's total length so Ethernet padding
    /// is not mistaken for transport data.
    pub fn from_bytes(data: &'a [u8]) -> Option<Self> {
        if data.len() < Self::MIN_HEADER_SIZE {
            return None;
        }

        let version = data[0] >> 4;
        if version != 4 {
            return None;
        }

        let header_len = ((data[0] & 0x0F) as usize) * 4;
        if header_len < Self::MIN_HEADER_SIZE || data.len() < header_len {
            return None;
        }

        let total_length = u16::from_be_bytes([data[2], data[3]]) as usize;
        let end = if total_length >= header_len {
            total_length.min(data.len())
        } else {
            data.len()
        };

        Some(Ipv4Packet {
            source: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            destination: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            protocol: data[9],
            header_len,
            payload: &data[header_len..end],
        })
    }
}

/// IPv6 extension headers skipped while looking for the upper layer
const HOP_BY_HOP: u8 = 0;
const ROUTING: u8 = 43;
const DESTINATION_OPTIONS: u8 = 60;

/// IPv6 packet view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv6Packet<'a> {
    pub source: Ipv6Addr,
    pub destination: Ipv6Addr,
    pub hop_limit: u8,
    /// Upper-layer protocol after any skipped extension headers
    pub next_header: u8,
    pub payload: &'a [u8],
}

impl<'a> Ipv6Packet<'a> {
    /// Fixed IPv6 header size
    pub const HEADER_SIZE: usize = 40;

    /// Parse an IPv6 packet from bytes
    pub fn from_bytes(data: &'a [u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE {
            return None;
        }

        if data[0] >> 4 != 6 {
            return None;
        }

        let payload_length = u16::from_be_bytes([data[4], data[5]]) as usize;
        let mut next_header = data[6];
        let hop_limit = data[7];

        let mut src = [0u8; 16];
        src.copy_from_slice(&data[8..24]);
        let mut dst = [0u8; 16];
        dst.copy_from_slice(&data[24..40]);

        let end = (Self::HEADER_SIZE + payload_length).min(data.len());
        let mut offset = Self::HEADER_SIZE;

        while matches!(next_header, HOP_BY_HOP | ROUTING | DESTINATION_OPTIONS) {
            if offset + 2 > end {
                return None;
            }
            let ext_len = (data[offset + 1] as usize + 1) * 8;
            next_header = data[offset];
            offset += ext_len;
            if offset > end {
                return None;
            }
        }

        Some(Ipv6Packet {
            source: Ipv6Addr::from(src),
            destination: Ipv6Addr::from(dst),
            hop_limit,
            next_header,
            payload: &data[offset..end],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ipv4_header(protocol: u8, total_length: u16) -> Vec<u8> {
        let mut data = vec![0x45, 0x00];
        data.extend_from_slice(&total_length.to_be_bytes());
        data.extend_from_slice(&[0, 0, 0, 0, 64, protocol, 0, 0]);
        data.extend_from_slice(&[10, 0, 0, 1]);
        data.extend_from_slice(&[255, 255, 255, 255]);
        data
    }

    #[test]
    fn test_ipv4_from_bytes() {
        let mut data = ipv4_header(17, 24);
        data.extend_from_slice(&[1, 2, 3, 4]);
        data.extend_from_slice(&[0, 0]); // Ethernet padding

        let packet = Ipv4Packet::from_bytes(&data).unwrap();
        assert_eq!(packet.source, Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(packet.destination, Ipv4Addr::BROADCAST);
        assert_eq!(packet.protocol, 17);
        assert_eq!(packet.payload, &[1, 2, 3, 4]);
    }

    #[test]
    fn test_ipv4_rejects_wrong_version() {
        let mut data = ipv4_header(17, 20);
        data[0] = 0x65;
        assert!(Ipv4Packet::from_bytes(&data).is_none());
        assert!(Ipv4Packet::from_bytes(&data[..10]).is_none());
    }

    fn ipv6_header(next_header: u8, payload_len: u16) -> Vec<u8> {
        let mut data = vec![0x60, 0, 0, 0];
        data.extend_from_slice(&payload_len.to_be_bytes());
        data.push(next_header);
        data.push(255);
        data.extend_from_slice(&"fe80::1".parse::<Ipv6Addr>().unwrap().octets());
        data.extend_from_slice(&"ff02::1:ff00:1".parse::<Ipv6Addr>().unwrap().octets());
        data
    }

    #[test]
    fn test_ipv6_from_bytes() {
        let mut data = ipv6_header(58, 4);
        data.extend_from_slice(&[135, 0, 0, 0]);

        let packet = Ipv6Packet::from_bytes(&data).unwrap();
        assert_eq!(packet.source, "fe80::1".parse::<Ipv6Addr>().unwrap());
        assert_eq!(packet.next_header, 58);
        assert_eq!(packet.hop_limit, 255);
        assert_eq!(packet.payload, &[135, 0, 0, 0]);
    }

    #[test]
    fn test_ipv6_skips_hop_by_hop() {
        let mut data = ipv6_header(0, 12);
        // Hop-by-hop: next=58, len=0 (8 bytes), router alert + padding
        data.extend_from_slice(&[58, 0, 5, 2, 0, 0, 1, 0]);
        data.extend_from_slice(&[143, 0, 0, 0]);

        let packet = Ipv6Packet::from_bytes(&data).unwrap();
        assert_eq!(packet.next_header, 58);
        assert_eq!(packet.payload, &[143, 0, 0, 0]);
    }

    #[test]
    fn test_ipv6_truncated_extension() {
        let mut data = ipv6_header(0, 4);
        data.extend_from_slice(&[58, 3, 0, 0]);
        assert!(Ipv6Packet::from_bytes(&data).is_none());
    }
}
