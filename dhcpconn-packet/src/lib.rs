//! dhcpconn packet decoders
//!
//! Zero-copy decoders for the layers a connectivity check needs to look at in
//! captured traffic: Ethernet (with optional 802.1Q tag), IPv4, IPv6, UDP,
//! DHCP and ICMPv6 Neighbor Solicitation.

pub mod dhcp;
pub mod ethernet;
pub mod icmpv6;
pub mod ip;
pub mod udp;

#[cfg(any(test, feature = "testing"))]
pub mod fixtures;

pub use dhcp::{DhcpMessageType, DhcpOption, DhcpPacket};
pub use ethernet::{EtherType, EthernetFrame};
pub use icmpv6::{Icmpv6Header, NdType, NeighborSolicitation};
pub use ip::{Ipv4Packet, Ipv6Packet};
pub use udp::UdpDatagram;

#[cfg(test)]
mod tests {
    use super::*;
    use dhcpconn_core::MacAddr;

    const DEVICE: MacAddr = MacAddr::new([0x02, 0x42, 0xAC, 0x11, 0x00, 0x02]);

    #[test]
    fn test_decode_dhcp_fixture_through_layers() {
        let frame = fixtures::dhcp_client_frame(DEVICE, DhcpMessageType::Request);

        let eth = EthernetFrame::from_bytes(&frame).unwrap();
        assert_eq!(eth.source, DEVICE);
        assert_eq!(eth.ethertype, EtherType::IPv4);

        let ip = Ipv4Packet::from_bytes(eth.payload).unwrap();
        assert_eq!(ip.protocol, 17);

        let udp = UdpDatagram::from_bytes(ip.payload).unwrap();
        assert!(udp.uses_port(67));

        let dhcp = DhcpPacket::parse(udp.payload).unwrap();
        assert_eq!(dhcp.message_type(), Some(DhcpMessageType::Request));
        assert_eq!(&dhcp.chaddr[..6], &DEVICE.0[..]);
    }

    #[test]
    fn test_decode_ns_fixture_through_layers() {
        let target = "fd10:77be:4186::1".parse().unwrap();
        let frame = fixtures::neighbor_solicitation_frame(DEVICE, target);

        let eth = EthernetFrame::from_bytes(&frame).unwrap();
        assert_eq!(eth.ethertype, EtherType::IPv6);

        let ip = Ipv6Packet::from_bytes(eth.payload).unwrap();
        assert_eq!(ip.next_header, 58);

        let ns = NeighborSolicitation::from_icmpv6(ip.payload).unwrap();
        assert_eq!(ns.target, target);
    }
}
