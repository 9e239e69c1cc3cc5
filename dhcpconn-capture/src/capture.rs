//! Reading finished pcap files into memory

use crate::filters;
use dhcpconn_core::{CapturePaths, Error, MacAddr, Result};
use pcap::Capture;
use std::path::Path;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// One frame read from a capture file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedFrame {
    /// Capture timestamp
    pub timestamp: SystemTime,
    /// Captured bytes (may be shorter than the frame on the wire)
    pub data: Vec<u8>,
    /// Length of the frame on the wire
    pub original_len: u32,
}

impl CapturedFrame {
    /// Frame with the current time and no truncation
    pub fn new(data: Vec<u8>) -> Self {
        let original_len = data.len() as u32;
        Self {
            timestamp: SystemTime::now(),
            data,
            original_len,
        }
    }

    /// Whether the snapshot length cut this frame short
    pub fn is_truncated(&self) -> bool {
        (self.data.len() as u32) < self.original_len
    }
}

/// An ordered, finite set of captured frames
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CaptureSet {
    frames: Vec<CapturedFrame>,
}

impl CaptureSet {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Set built from frames already in memory
    pub fn from_frames(frames: Vec<CapturedFrame>) -> Self {
        Self { frames }
    }

    /// Read every file in order and concatenate their frames
    pub fn open<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        Self::read(paths, None)
    }

    /// Like [`CaptureSet::open`], keeping only frames matching a BPF filter
    pub fn open_filtered<P: AsRef<Path>>(paths: &[P], bpf: &str) -> Result<Self> {
        Self::read(paths, Some(bpf))
    }

    /// DHCP frames of the startup capture followed by the monitor capture
    pub fn open_dhcp(paths: &CapturePaths) -> Result<Self> {
        Self::open_filtered(&[&paths.startup, &paths.monitor], &filters::dhcp_filter())
    }

    /// IPv6 frames sent by `mac` in the monitor capture
    pub fn open_device_ipv6(paths: &CapturePaths, mac: &MacAddr) -> Result<Self> {
        Self::open_filtered(&[&paths.monitor], &filters::device_ipv6_filter(mac))
    }

    fn read<P: AsRef<Path>>(paths: &[P], bpf: Option<&str>) -> Result<Self> {
        let mut set = Self::new();
        for path in paths {
            let frames = read_file(path.as_ref(), bpf)?;
            set.frames.extend(frames);
        }
        Ok(set)
    }

    /// Append one frame
    pub fn push(&mut self, frame: CapturedFrame) {
        self.frames.push(frame);
    }

    /// Append every frame of another set
    pub fn extend(&mut self, other: CaptureSet) {
        self.frames.extend(other.frames);
    }

    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CapturedFrame> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl<'a> IntoIterator for &'a CaptureSet {
    type Item = &'a CapturedFrame;
    type IntoIter = std::slice::Iter<'a, CapturedFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

fn read_file(path: &Path, bpf: Option<&str>) -> Result<Vec<CapturedFrame>> {
    debug!("Opening capture file: {}", path.display());

    let mut capture = Capture::from_file(path).map_err(|e| {
        Error::Capture(format!("Failed to open {}: {}", path.display(), e))
    })?;

    if let Some(filter) = bpf {
        capture
            .filter(filter, true)
            .map_err(|e| Error::Capture(format!("Invalid BPF filter '{}': {}", filter, e)))?;
        debug!("Applied filter: {}", filter);
    }

    let mut frames = Vec::new();
    loop {
        match capture.next_packet() {
            Ok(packet) => {
                let secs = packet.header.ts.tv_sec.max(0) as u64;
                let micros = packet.header.ts.tv_usec.max(0) as u64;
                frames.push(CapturedFrame {
                    timestamp: UNIX_EPOCH
                        + Duration::from_secs(secs)
                        + Duration::from_micros(micros),
                    data: packet.data.to_vec(),
                    original_len: packet.header.len,
                });
            }
            Err(pcap::Error::NoMorePackets) => break,
            Err(e) => {
                return Err(Error::Capture(format!(
                    "Failed reading {}: {}",
                    path.display(),
                    e
                )))
            }
        }
    }

    info!("Read {} frames from {}", frames.len(), path.display());
    Ok(frames)
}
