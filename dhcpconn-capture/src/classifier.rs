//! Protocol-level questions over captured traffic
//!
//! The classifier decodes each frame just far enough to tell DHCP messages,
//! Neighbor Solicitations and other IPv6 traffic apart. Scans are pure over
//! the frames they are given; nothing is read from disk here.

use crate::capture::{CaptureSet, CapturedFrame};
use crate::stats::ClassificationStats;
use dhcpconn_core::config::DEFAULT_HARNESS_MAC_PREFIX;
use dhcpconn_core::{protocol_constants, Error, MacAddr, Result, TestOutcome};
use dhcpconn_packet::{
    DhcpMessageType, DhcpPacket, EtherType, EthernetFrame, Ipv4Packet, Ipv6Packet,
    NeighborSolicitation, UdpDatagram,
};
use std::collections::BTreeSet;
use std::net::Ipv6Addr;
use tracing::{debug, info, Span};

/// What a captured frame turned out to be
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameKind {
    /// DHCP message; `message_type` is absent for plain BOOTP
    Dhcp {
        message_type: Option<DhcpMessageType>,
        source_mac: MacAddr,
    },
    /// ICMPv6 Neighbor Solicitation
    NeighborSolicitation { source_mac: MacAddr, target: Ipv6Addr },
    /// Any other IPv6 frame
    OtherIpv6 { source_mac: MacAddr },
    /// Not relevant, or not decodable
    Other,
}

impl FrameKind {
    /// Source MAC of an IPv6 frame
    pub fn ipv6_source(&self) -> Option<MacAddr> {
        match self {
            FrameKind::NeighborSolicitation { source_mac, .. }
            | FrameKind::OtherIpv6 { source_mac } => Some(*source_mac),
            _ => None,
        }
    }
}

/// Outcome of a SLAAC scan, with the address the device formed if any
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlaacDetection {
    pub outcome: TestOutcome,
    pub address: Option<Ipv6Addr>,
}

/// Decode one frame far enough to classify it
pub fn decode(data: &[u8]) -> Result<FrameKind> {
    let eth = EthernetFrame::from_bytes(data)
        .ok_or_else(|| Error::PacketParsing("truncated Ethernet header".to_string()))?;

    match eth.ethertype {
        EtherType::IPv4 => {
            let ip = Ipv4Packet::from_bytes(eth.payload)
                .ok_or_else(|| Error::PacketParsing("malformed IPv4 header".to_string()))?;
            if ip.protocol != protocol_constants::IP_PROTO_UDP {
                return Ok(FrameKind::Other);
            }
            let udp = UdpDatagram::from_bytes(ip.payload)
                .ok_or_else(|| Error::PacketParsing("truncated UDP header".to_string()))?;
            if !udp.uses_port(protocol_constants::DHCP_SERVER_PORT)
                && !udp.uses_port(protocol_constants::DHCP_CLIENT_PORT)
            {
                return Ok(FrameKind::Other);
            }
            let dhcp = DhcpPacket::parse(udp.payload).map_err(Error::PacketParsing)?;
            Ok(FrameKind::Dhcp {
                message_type: dhcp.message_type(),
                source_mac: eth.source,
            })
        }
        EtherType::IPv6 => {
            let ip = Ipv6Packet::from_bytes(eth.payload)
                .ok_or_else(|| Error::PacketParsing("malformed IPv6 header".to_string()))?;
            if ip.next_header == protocol_constants::IP_PROTO_ICMPV6 {
                if let Some(ns) = NeighborSolicitation::from_icmpv6(ip.payload) {
                    return Ok(FrameKind::NeighborSolicitation {
                        source_mac: eth.source,
                        target: ns.target,
                    });
                }
            }
            Ok(FrameKind::OtherIpv6 {
                source_mac: eth.source,
            })
        }
        _ => Ok(FrameKind::Other),
    }
}

/// Answers DHCP and IPv6 questions about a capture set
pub struct PacketClassifier {
    span: Span,
    harness_mac_prefix: String,
}

impl PacketClassifier {
    /// Classifier logging under `span`
    pub fn new(span: Span) -> Self {
        Self {
            span,
            harness_mac_prefix: DEFAULT_HARNESS_MAC_PREFIX.to_string(),
        }
    }

    /// Override the MAC prefix treated as test-harness noise
    pub fn with_harness_mac_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.harness_mac_prefix = prefix.into();
        self
    }

    /// Classify one frame; undecodable frames are [`FrameKind::Other`]
    pub fn classify(&self, frame: &CapturedFrame) -> FrameKind {
        decode(&frame.data).unwrap_or(FrameKind::Other)
    }

    /// Classify every frame, returning kinds in capture order
    pub fn classify_all(&self, frames: &CaptureSet) -> (Vec<FrameKind>, ClassificationStats) {
        let mut stats = ClassificationStats::new();
        let kinds = frames
            .iter()
            .map(|frame| {
                let kind = match decode(&frame.data) {
                    Ok(kind) => kind,
                    Err(e) => {
                        stats.record_failure();
                        let _enter = self.span.enter();
                        debug!(error = %e, "Undecodable frame");
                        FrameKind::Other
                    }
                };
                stats.record(&kind);
                kind
            })
            .collect();
        (kinds, stats)
    }

    fn is_harness(&self, mac: &MacAddr) -> bool {
        !self.harness_mac_prefix.is_empty() && mac.has_prefix(&self.harness_mac_prefix)
    }

    /// Source MACs of every DHCPREQUEST, excluding test-harness containers
    pub fn dhcp_request_sources(&self, frames: &CaptureSet) -> BTreeSet<MacAddr> {
        let _enter = self.span.enter();
        let (kinds, stats) = self.classify_all(frames);
        debug!(%stats, "DHCP scan complete");

        let mut sources = BTreeSet::new();
        for kind in kinds {
            if let FrameKind::Dhcp {
                message_type: Some(DhcpMessageType::Request),
                source_mac,
            } = kind
            {
                info!(mac = %source_mac, "DHCPREQUEST detected");
                if !self.is_harness(&source_mac) {
                    sources.insert(source_mac);
                }
            }
        }
        sources
    }

    /// PASS iff the device is the only non-harness MAC that sent DHCPREQUESTs
    pub fn detect_single_address_usage(
        &self,
        frames: &CaptureSet,
        device_mac: MacAddr,
    ) -> TestOutcome {
        let _enter = self.span.enter();
        info!("Inspecting {} frames", frames.len());

        let sources = self.dhcp_request_sources(frames);
        let expected = BTreeSet::from([device_mac]);
        let single = sources == expected;

        info!(
            device = %device_mac,
            seen = sources.len(),
            "DHCPREQUEST detected from device: {}",
            sources.contains(&device_mac)
        );

        if single {
            TestOutcome::pass("Device is using a single IP address")
        } else {
            TestOutcome::fail("Device is using multiple IP addresses")
        }
    }

    /// Look for a Neighbor Solicitation from the device targeting `prefix`
    ///
    /// The last matching target wins.
    pub fn detect_ipv6_slaac(
        &self,
        frames: &CaptureSet,
        device_mac: MacAddr,
        prefix: &str,
    ) -> SlaacDetection {
        let _enter = self.span.enter();
        let prefix = prefix.to_ascii_lowercase();
        let (kinds, stats) = self.classify_all(frames);
        debug!(%stats, "IPv6 scan complete");

        let mut sends_ipv6 = false;
        let mut address = None;
        for kind in &kinds {
            if kind.ipv6_source() != Some(device_mac) {
                continue;
            }
            sends_ipv6 = true;
            if let FrameKind::NeighborSolicitation { target, .. } = kind {
                if target.to_string().starts_with(&prefix) {
                    address = Some(*target);
                }
            }
        }

        let outcome = match address {
            Some(addr) => {
                info!("Device has formed SLAAC address {}", addr);
                TestOutcome::pass(format!("Device has formed SLAAC address {}", addr))
            }
            None if sends_ipv6 => {
                info!("Device does not support IPv6 SLAAC");
                TestOutcome::fail("Device does not support IPv6 SLAAC")
            }
            None => {
                info!("Device does not support IPv6");
                TestOutcome::fail("Device does not support IPv6")
            }
        };

        SlaacDetection { outcome, address }
    }
}
