//! Hand-assembled frames for tests
//!
//! Checksums are left zero; nothing in the decoders verifies them.

use crate::dhcp::{DhcpMessageType, BOOTP_HEADER_SIZE, BOOTREPLY, BOOTREQUEST, DHCP_MAGIC_COOKIE};
use bytes::{BufMut, BytesMut};
use dhcpconn_core::{ethertypes, protocol_constants, MacAddr};
use std::net::{Ipv4Addr, Ipv6Addr};

/// Ethernet broadcast address
pub const BROADCAST: MacAddr = MacAddr::new([0xFF; 6]);

fn ethernet(dst: MacAddr, src: MacAddr, ethertype: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(14 + payload.len());
    buf.put_slice(dst.as_bytes());
    buf.put_slice(src.as_bytes());
    buf.put_u16(ethertype);
    buf.put_slice(payload);
    buf.to_vec()
}

fn ipv4(src: Ipv4Addr, dst: Ipv4Addr, protocol: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(20 + payload.len());
    buf.put_u8(0x45);
    buf.put_u8(0);
    buf.put_u16((20 + payload.len()) as u16);
    buf.put_u16(0);
    buf.put_u16(0);
    buf.put_u8(64);
    buf.put_u8(protocol);
    buf.put_u16(0);
    buf.put_slice(&src.octets());
    buf.put_slice(&dst.octets());
    buf.put_slice(payload);
    buf.to_vec()
}

fn ipv6(src: Ipv6Addr, dst: Ipv6Addr, next_header: u8, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(40 + payload.len());
    buf.put_u32(0x6000_0000);
    buf.put_u16(payload.len() as u16);
    buf.put_u8(next_header);
    buf.put_u8(255);
    buf.put_slice(&src.octets());
    buf.put_slice(&dst.octets());
    buf.put_slice(payload);
    buf.to_vec()
}

fn udp(src_port: u16, dst_port: u16, payload: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(8 + payload.len());
    buf.put_u16(src_port);
    buf.put_u16(dst_port);
    buf.put_u16((8 + payload.len()) as u16);
    buf.put_u16(0);
    buf.put_slice(payload);
    buf.to_vec()
}

fn bootp(op: u8, client: MacAddr, message_type: DhcpMessageType) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(BOOTP_HEADER_SIZE + 8);
    buf.put_u8(op);
    buf.put_u8(1);
    buf.put_u8(6);
    buf.put_u8(0);
    buf.put_u32(0x3903_F326);
    // secs, flags, ciaddr, yiaddr, siaddr, giaddr
    buf.put_bytes(0, 20);
    buf.put_slice(client.as_bytes());
    // chaddr padding, sname, file
    buf.put_bytes(0, 10 + 64 + 128);
    buf.put_u32(DHCP_MAGIC_COOKIE);
    buf.put_slice(&[53, 1, message_type as u8, 255]);
    buf.to_vec()
}

/// Client-originated DHCP message (broadcast, 68 -> 67)
pub fn dhcp_client_frame(src: MacAddr, message_type: DhcpMessageType) -> Vec<u8> {
    let dhcp = bootp(BOOTREQUEST, src, message_type);
    let datagram = udp(
        protocol_constants::DHCP_CLIENT_PORT,
        protocol_constants::DHCP_SERVER_PORT,
        &dhcp,
    );
    let packet = ipv4(
        Ipv4Addr::UNSPECIFIED,
        Ipv4Addr::BROADCAST,
        protocol_constants::IP_PROTO_UDP,
        &datagram,
    );
    ethernet(BROADCAST, src, ethertypes::IPV4, &packet)
}

/// Server reply to `client`, sourced from `server` (67 -> 68)
pub fn dhcp_server_frame(
    server: MacAddr,
    client: MacAddr,
    message_type: DhcpMessageType,
) -> Vec<u8> {
    let dhcp = bootp(BOOTREPLY, client, message_type);
    let datagram = udp(
        protocol_constants::DHCP_SERVER_PORT,
        protocol_constants::DHCP_CLIENT_PORT,
        &dhcp,
    );
    let packet = ipv4(
        Ipv4Addr::new(10, 10, 10, 2),
        Ipv4Addr::BROADCAST,
        protocol_constants::IP_PROTO_UDP,
        &datagram,
    );
    ethernet(client, server, ethertypes::IPV4, &packet)
}

/// Neighbor Solicitation for `target` sent by `src` (DAD form, unspecified source)
pub fn neighbor_solicitation_frame(src: MacAddr, target: Ipv6Addr) -> Vec<u8> {
    let mut icmp = BytesMut::with_capacity(24);
    icmp.put_u8(135);
    icmp.put_u8(0);
    icmp.put_u16(0);
    icmp.put_u32(0);
    icmp.put_slice(&target.octets());

    let mut solicited = [0xFF, 0x02, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x01, 0xFF, 0, 0, 0];
    solicited[13..].copy_from_slice(&target.octets()[13..]);
    let packet = ipv6(
        Ipv6Addr::UNSPECIFIED,
        Ipv6Addr::from(solicited),
        protocol_constants::IP_PROTO_ICMPV6,
        &icmp,
    );
    let dst = MacAddr::new([0x33, 0x33, 0xFF, solicited[13], solicited[14], solicited[15]]);
    ethernet(dst, src, ethertypes::IPV6, &packet)
}

/// ICMPv6 Router Solicitation from `src`: IPv6 traffic that is not an NS
pub fn router_solicitation_frame(src: MacAddr) -> Vec<u8> {
    let icmp = [133, 0, 0, 0, 0, 0, 0, 0];
    let all_routers: Ipv6Addr = Ipv6Addr::new(0xff02, 0, 0, 0, 0, 0, 0, 2);
    let link_local = Ipv6Addr::new(0xfe80, 0, 0, 0, 0, 0, 0, 1);
    let packet = ipv6(
        link_local,
        all_routers,
        protocol_constants::IP_PROTO_ICMPV6,
        &icmp,
    );
    let dst = MacAddr::new([0x33, 0x33, 0, 0, 0, 0x02]);
    ethernet(dst, src, ethertypes::IPV6, &packet)
}

/// ARP request from `src`
pub fn arp_frame(src: MacAddr) -> Vec<u8> {
    let mut arp = BytesMut::with_capacity(28);
    arp.put_u16(1);
    arp.put_u16(ethertypes::IPV4);
    arp.put_u8(6);
    arp.put_u8(4);
    arp.put_u16(1);
    arp.put_slice(src.as_bytes());
    arp.put_slice(&[10, 10, 10, 14]);
    arp.put_bytes(0, 6);
    arp.put_slice(&[10, 10, 10, 1]);
    ethernet(BROADCAST, src, 0x0806, &arp)
}
