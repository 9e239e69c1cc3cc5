//! UDP header parsing

/// UDP datagram view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpDatagram<'a> {
    pub source_port: u16,
    pub destination_port: u16,
    pub payload: &'a [u8],
}

impl<'a> UdpDatagram<'a> {
    /// UDP header size in bytes
    pub const HEADER_SIZE: usize = 8;

    /// Parse a UDP datagram from bytes
    ///
    /// Checksums are not validated; captured traffic is taken as seen.
    pub fn from_bytes(data: &'a [u8]) -> Option<Self> {
        if data.len() < Self::HEADER_SIZE {
            return None;
        }

        let source_port = u16::from_be_bytes([data[0], data[1]]);
        let destination_port = u16::from_be_bytes([data[2], data[3]]);
        let length = u16::from_be_bytes([data[4], data[5]]) as usize;

        let end = if length >= Self::HEADER_SIZE {
            length.min(data.len())
        } else {
            data.len()
        };

        Some(UdpDatagram {
            source_port,
            destination_port,
            payload: &data[Self::HEADER_SIZE..end],
        })
    }

    /// Whether either port is `port`
    pub fn uses_port(&self, port: u16) -> bool {
        self.source_port == port || self.destination_port == port
    }
}
