//! Capture files written from in-memory frames, for tests

use bytes::{BufMut, BytesMut};
use std::io;
use std::path::Path;

/// Classic little-endian pcap file with Ethernet link type
pub fn pcap_bytes(frames: &[Vec<u8>]) -> Vec<u8> {
    let mut buf = BytesMut::new();
    buf.put_u32_le(0xa1b2_c3d4);
    buf.put_u16_le(2);
    buf.put_u16_le(4);
    buf.put_i32_le(0);
    buf.put_u32_le(0);
    buf.put_u32_le(65535);
    buf.put_u32_le(1);
    for (i, frame) in frames.iter().enumerate() {
        buf.put_u32_le(1_700_000_000 + i as u32);
        buf.put_u32_le(250);
        buf.put_u32_le(frame.len() as u32);
        buf.put_u32_le(frame.len() as u32);
        buf.put_slice(frame);
    }
    buf.to_vec()
}

/// Write `frames` as a pcap file at `path`
pub fn write_pcap(path: &Path, frames: &[Vec<u8>]) -> io::Result<()> {
    std::fs::write(path, pcap_bytes(frames))
}
