//! Ethernet II frame parsing
//!
//! Frames are decoded in place; payloads borrow from the captured bytes.

use dhcpconn_core::{ethertypes, MacAddr};
use std::fmt;

/// EtherType values the classifier cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// IPv4 (0x0800)
    IPv4,
    /// IPv6 (0x86DD)
    IPv6,
    /// ARP (0x0806)
    ARP,
    /// Length field (802.3/LLC), not an EtherType
    Length(u16),
    /// Anything else
    Other(u16),
}

impl EtherType {
    pub fn from_u16(value: u16) -> Self {
        match value {
            ethertypes::IPV4 => EtherType::IPv4,
            ethertypes::IPV6 => EtherType::IPv6,
            0x0806 => EtherType::ARP,
            val if val <= 1500 => EtherType::Length(val),
            val => EtherType::Other(val),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::IPv4 => write!(f, "IPv4"),
            EtherType::IPv6 => write!(f, "IPv6"),
            EtherType::ARP => write!(f, "ARP"),
            EtherType::Length(len) => write!(f, "LLC({})", len),
            EtherType::Other(val) => write!(f, "0x{:04X}", val),
        }
    }
}

/// Ethernet II frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame<'a> {
    /// Destination MAC address
    pub destination: MacAddr,
    /// Source MAC address
    pub source: MacAddr,
    /// 802.1Q VLAN ID, if the frame carried a tag
    pub vlan_id: Option<u16>,
    /// EtherType of the payload (after any VLAN tag)
    pub ethertype: EtherType,
    /// Payload data
    pub payload: &'a [u8],
}

impl<'a> EthernetFrame<'a> {
    /// Ethernet header size (dst + src + type/length)
    pub const HEADER_SIZE: usize = 14;

    /// Size of one 802.1Q tag
    pub const VLAN_TAG_SIZE: usize = 4;

    /// Parse an Ethernet frame from bytes
    pub fn from_bytes(data: &'a [u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE {
            return None;
        }

        let destination = MacAddr::from_slice(&data[0..6])?;
        let source = MacAddr::from_slice(&data[6..12])?;
        let mut type_field = u16::from_be_bytes([data[12], data[13]]);
        let mut offset = Self::HEADER_SIZE;

        // A single 802.1Q tag; stacked tags are left as Other
        let mut vlan_id = None;
        if type_field == ethertypes::DOT1Q {
            if data.len() < offset + Self::VLAN_TAG_SIZE {
                return None;
            }
            vlan_id = Some(u16::from_be_bytes([data[offset], data[offset + 1]]) & 0x0FFF);
            type_field = u16::from_be_bytes([data[offset + 2], data[offset + 3]]);
            offset += Self::VLAN_TAG_SIZE;
        }

        let ethertype = EtherType::from_u16(type_field);
        let payload = match ethertype {
            EtherType::Length(len) => {
                let end = (offset + len as usize).min(data.len());
                &data[offset..end]
            }
            _ => &data[offset..],
        };

        Some(EthernetFrame {
            destination,
            source,
            vlan_id,
            ethertype,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethertype_conversion() {
        assert_eq!(EtherType::from_u16(0x0800), EtherType::IPv4);
        assert_eq!(EtherType::from_u16(0x86DD), EtherType::IPv6);
        assert_eq!(EtherType::from_u16(0x0026), EtherType::Length(0x26));
        assert_eq!(EtherType::from_u16(0x88CC), EtherType::Other(0x88CC));
    }

    #[test]
    fn test_ethernet_frame_from_bytes() {
        let data = vec![
            0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF, // dst
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // src
            0x08, 0x00, // IPv4
            0x01, 0x02, 0x03, 0x04, // payload
        ];

        let frame = EthernetFrame::from_bytes(&data).unwrap();
        assert_eq!(frame.destination.0, [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF]);
        assert_eq!(frame.source.to_string(), "00:11:22:33:44:55");
        assert_eq!(frame.ethertype, EtherType::IPv4);
        assert_eq!(frame.vlan_id, None);
        assert_eq!(frame.payload, &[0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn test_ethernet_frame_vlan_tag() {
        let data = vec![
            0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, // dst
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // src
            0x81, 0x00, 0x00, 0x64, // VLAN 100
            0x86, 0xDD, // IPv6
            0x60, 0x00,
        ];

        let frame = EthernetFrame::from_bytes(&data).unwrap();
        assert_eq!(frame.vlan_id, Some(100));
        assert_eq!(frame.ethertype, EtherType::IPv6);
        assert_eq!(frame.payload, &[0x60, 0x00]);
    }

    #[test]
    fn test_ethernet_frame_too_short() {
        assert!(EthernetFrame::from_bytes(&[0u8; 13]).is_none());
        let truncated_vlan = [
            0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0x11, 0x22, 0x33, 0x44, 0x55, 0x81, 0x00, 0x00,
        ];
        assert!(EthernetFrame::from_bytes(&truncated_vlan).is_none());
    }
}
