//! Capture reading and classification for dhcpconn
//!
//! Finished pcap files are read fully into a [`CaptureSet`]; the
//! [`PacketClassifier`] then answers the questions the connectivity checks
//! ask of captured traffic: which MACs sent DHCPREQUESTs, and whether a
//! device formed a SLAAC address.

pub mod capture;
pub mod classifier;
pub mod filters;
pub mod stats;

#[cfg(any(test, feature = "testing"))]
pub mod fixtures;

pub use capture::{CaptureSet, CapturedFrame};
pub use classifier::{FrameKind, PacketClassifier, SlaacDetection};
pub use stats::ClassificationStats;
