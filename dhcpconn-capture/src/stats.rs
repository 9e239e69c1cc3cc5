//! Per-scan classification counters

use crate::classifier::FrameKind;
use dhcpconn_packet::DhcpMessageType;
use std::fmt;

/// Frame counts for one pass over a capture set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassificationStats {
    /// Frames examined
    pub frames: u64,
    /// DHCP messages of any type
    pub dhcp: u64,
    /// DHCP messages whose type was REQUEST
    pub dhcp_requests: u64,
    /// ICMPv6 Neighbor Solicitations
    pub neighbor_solicitations: u64,
    /// Other IPv6 traffic
    pub other_ipv6: u64,
    /// Everything else, including undecodable frames
    pub other: u64,
    /// Frames a decoder rejected
    pub parse_failures: u64,
}

impl ClassificationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one classified frame
    pub fn record(&mut self, kind: &FrameKind) {
        self.frames += 1;
        match kind {
            FrameKind::Dhcp { message_type, .. } => {
                self.dhcp += 1;
                if *message_type == Some(DhcpMessageType::Request) {
                    self.dhcp_requests += 1;
                }
            }
            FrameKind::NeighborSolicitation { .. } => self.neighbor_solicitations += 1,
            FrameKind::OtherIpv6 { .. } => self.other_ipv6 += 1,
            FrameKind::Other => self.other += 1,
        }
    }

    /// Count a frame that failed to decode
    pub fn record_failure(&mut self) {
        self.parse_failures += 1;
    }

    /// IPv6 frames of any kind
    pub fn ipv6(&self) -> u64 {
        self.neighbor_solicitations + self.other_ipv6
    }

    /// Add another scan's counts
    pub fn merge(&mut self, other: &ClassificationStats) {
        self.frames += other.frames;
        self.dhcp += other.dhcp;
        self.dhcp_requests += other.dhcp_requests;
        self.neighbor_solicitations += other.neighbor_solicitations;
        self.other_ipv6 += other.other_ipv6;
        self.other += other.other;
        self.parse_failures += other.parse_failures;
    }
}

impl fmt::Display for ClassificationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} frames: {} DHCP ({} REQUEST), {} NS, {} other IPv6, {} other, {} undecodable",
            self.frames,
            self.dhcp,
            self.dhcp_requests,
            self.neighbor_solicitations,
            self.other_ipv6,
            self.other,
            self.parse_failures
        )
    }
}
