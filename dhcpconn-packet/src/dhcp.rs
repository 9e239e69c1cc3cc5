//! DHCP message decoding (RFC 2131 / RFC 2132)
//!
//! Only what is needed to classify captured traffic: the BOOTP header fields
//! and the option list. Nothing here builds DHCP messages.

use std::fmt;
use std::net::Ipv4Addr;

/// DHCP magic cookie value (0x63825363)
pub const DHCP_MAGIC_COOKIE: u32 = 0x63825363;

/// Fixed BOOTP header size
pub const BOOTP_HEADER_SIZE: usize = 236;

/// BOOTREQUEST opcode
pub const BOOTREQUEST: u8 = 1;

/// BOOTREPLY opcode
pub const BOOTREPLY: u8 = 2;

/// DHCP Message Types (option 53)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DhcpMessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nak = 6,
    Release = 7,
    Inform = 8,
}

impl DhcpMessageType {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(DhcpMessageType::Discover),
            2 => Some(DhcpMessageType::Offer),
            3 => Some(DhcpMessageType::Request),
            4 => Some(DhcpMessageType::Decline),
            5 => Some(DhcpMessageType::Ack),
            6 => Some(DhcpMessageType::Nak),
            7 => Some(DhcpMessageType::Release),
            8 => Some(DhcpMessageType::Inform),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DhcpMessageType::Discover => "DISCOVER",
            DhcpMessageType::Offer => "OFFER",
            DhcpMessageType::Request => "REQUEST",
            DhcpMessageType::Decline => "DECLINE",
            DhcpMessageType::Ack => "ACK",
            DhcpMessageType::Nak => "NAK",
            DhcpMessageType::Release => "RELEASE",
            DhcpMessageType::Inform => "INFORM",
        }
    }
}

impl fmt::Display for DhcpMessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decoded DHCP option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DhcpOption {
    Hostname(String),
    RequestedIpAddress(Ipv4Addr),
    LeaseTime(u32),
    MessageType(DhcpMessageType),
    ServerId(Ipv4Addr),
    /// Any other option, or a known option whose body was malformed
    Unknown(u8, Vec<u8>),
}

fn ipv4_from(data: &[u8]) -> Option<Ipv4Addr> {
    let octets: [u8; 4] = data.try_into().ok()?;
    Some(Ipv4Addr::from(octets))
}

impl DhcpOption {
    /// Decode one option body
    pub fn parse(code: u8, data: &[u8]) -> Self {
        let decoded = match code {
            12 => Some(DhcpOption::Hostname(
                String::from_utf8_lossy(data).to_string(),
            )),
            50 => ipv4_from(data).map(DhcpOption::RequestedIpAddress),
            51 => data
                .try_into()
                .ok()
                .map(|bytes: [u8; 4]| DhcpOption::LeaseTime(u32::from_be_bytes(bytes))),
            53 => match data {
                [value] => DhcpMessageType::from_u8(*value).map(DhcpOption::MessageType),
                _ => None,
            },
            54 => ipv4_from(data).map(DhcpOption::ServerId),
            _ => None,
        };
        decoded.unwrap_or_else(|| DhcpOption::Unknown(code, data.to_vec()))
    }

    pub fn code(&self) -> u8 {
        match self {
            DhcpOption::Hostname(_) => 12,
            DhcpOption::RequestedIpAddress(_) => 50,
            DhcpOption::LeaseTime(_) => 51,
            DhcpOption::MessageType(_) => 53,
            DhcpOption::ServerId(_) => 54,
            DhcpOption::Unknown(code, _) => *code,
        }
    }
}

/// Decoded DHCP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DhcpPacket {
    /// 1 = BOOTREQUEST, 2 = BOOTREPLY
    pub op: u8,
    pub htype: u8,
    pub hlen: u8,
    /// Transaction ID
    pub xid: u32,
    pub ciaddr: Ipv4Addr,
    pub yiaddr: Ipv4Addr,
    pub siaddr: Ipv4Addr,
    pub giaddr: Ipv4Addr,
    /// Client hardware address (first `hlen` bytes used)
    pub chaddr: [u8; 16],
    pub options: Vec<DhcpOption>,
}

impl DhcpPacket {
    /// Parse a DHCP packet from a UDP payload
    pub fn parse(data: &[u8]) -> Result<Self, String> {
        if data.len() < BOOTP_HEADER_SIZE {
            return Err(format!(
                "DHCP packet too short: {} bytes (minimum {})",
                data.len(),
                BOOTP_HEADER_SIZE
            ));
        }

        let op = data[0];
        let htype = data[1];
        let hlen = data[2];
        let xid = u32::from_be_bytes([data[4], data[5], data[6], data[7]]);

        let ciaddr = Ipv4Addr::new(data[12], data[13], data[14], data[15]);
        let yiaddr = Ipv4Addr::new(data[16], data[17], data[18], data[19]);
        let siaddr = Ipv4Addr::new(data[20], data[21], data[22], data[23]);
        let giaddr = Ipv4Addr::new(data[24], data[25], data[26], data[27]);

        let mut chaddr = [0u8; 16];
        chaddr.copy_from_slice(&data[28..44]);

        // Plain BOOTP carries no cookie and no options
        let mut options = Vec::new();
        if data.len() >= BOOTP_HEADER_SIZE + 4 {
            let cookie = u32::from_be_bytes([data[236], data[237], data[238], data[239]]);
            if cookie != DHCP_MAGIC_COOKIE {
                return Err(format!("Bad DHCP magic cookie: 0x{:08x}", cookie));
            }
            options = Self::parse_options(&data[BOOTP_HEADER_SIZE + 4..])?;
        }

        Ok(Self {
            op,
            htype,
            hlen,
            xid,
            ciaddr,
            yiaddr,
            siaddr,
            giaddr,
            chaddr,
            options,
        })
    }

    fn parse_options(data: &[u8]) -> Result<Vec<DhcpOption>, String> {
        let mut options = Vec::new();
        let mut offset = 0;

        while offset < data.len() {
            let code = data[offset];
            offset += 1;

            match code {
                0 => continue,
                255 => break,
                _ => {}
            }

            if offset >= data.len() {
                return Err(format!("Option {} has no length byte", code));
            }
            let length = data[offset] as usize;
            offset += 1;

            if offset + length > data.len() {
                return Err(format!(
                    "Option {} length {} exceeds packet size",
                    code, length
                ));
            }

            options.push(DhcpOption::parse(code, &data[offset..offset + length]));
            offset += length;
        }

        Ok(options)
    }

    /// Get the message type from options
    pub fn message_type(&self) -> Option<DhcpMessageType> {
        self.options.iter().find_map(|opt| match opt {
            DhcpOption::MessageType(msg_type) => Some(*msg_type),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bootp(op: u8, options: &[u8]) -> Vec<u8> {
        let mut data = vec![0u8; BOOTP_HEADER_SIZE];
        data[0] = op;
        data[1] = 1;
        data[2] = 6;
        data[4..8].copy_from_slice(&0x12345678u32.to_be_bytes());
        data[28..34].copy_from_slice(&[0x02, 0x42, 0xAC, 0x11, 0x00, 0x02]);
        data.extend_from_slice(&DHCP_MAGIC_COOKIE.to_be_bytes());
        data.extend_from_slice(options);
        data
    }

    #[test]
    fn test_dhcp_message_type_conversion() {
        assert_eq!(DhcpMessageType::from_u8(1), Some(DhcpMessageType::Discover));
        assert_eq!(DhcpMessageType::from_u8(3), Some(DhcpMessageType::Request));
        assert_eq!(DhcpMessageType::from_u8(99), None);
        assert_eq!(DhcpMessageType::Request.to_string(), "REQUEST");
    }

    #[test]
    fn test_option_parse() {
        assert_eq!(
            DhcpOption::parse(53, &[3]),
            DhcpOption::MessageType(DhcpMessageType::Request)
        );
        assert_eq!(
            DhcpOption::parse(54, &[192, 168, 1, 1]),
            DhcpOption::ServerId(Ipv4Addr::new(192, 168, 1, 1))
        );
        assert_eq!(
            DhcpOption::parse(51, &[0x00, 0x01, 0x51, 0x80]),
            DhcpOption::LeaseTime(86400)
        );
        assert_eq!(
            DhcpOption::parse(12, b"dut"),
            DhcpOption::Hostname("dut".to_string())
        );
    }

    #[test]
    fn test_malformed_known_option_is_unknown() {
        assert_eq!(DhcpOption::parse(53, &[3, 3]), DhcpOption::Unknown(53, vec![3, 3]));
        assert_eq!(DhcpOption::parse(53, &[42]), DhcpOption::Unknown(53, vec![42]));
        assert_eq!(DhcpOption::parse(54, &[1, 2]).code(), 54);
    }

    #[test]
    fn test_parse_request() {
        let data = bootp(
            BOOTREQUEST,
            &[53, 1, 3, 0, 50, 4, 10, 10, 10, 14, 54, 4, 10, 10, 10, 2, 255, 0, 0],
        );
        let packet = DhcpPacket::parse(&data).unwrap();

        assert_eq!(packet.op, BOOTREQUEST);
        assert_eq!(packet.xid, 0x12345678);
        assert_eq!(packet.message_type(), Some(DhcpMessageType::Request));
        assert!(packet
            .options
            .contains(&DhcpOption::RequestedIpAddress(Ipv4Addr::new(10, 10, 10, 14))));
        assert!(packet
            .options
            .contains(&DhcpOption::ServerId(Ipv4Addr::new(10, 10, 10, 2))));
    }

    #[test]
    fn test_parse_too_short() {
        assert!(DhcpPacket::parse(&[0u8; 100]).is_err());
    }

    #[test]
    fn test_parse_bad_cookie() {
        let mut data = bootp(BOOTREQUEST, &[53, 1, 1, 255]);
        data[236] = 0;
        assert!(DhcpPacket::parse(&data).is_err());
    }

    #[test]
    fn test_parse_overlong_option() {
        let data = bootp(BOOTREQUEST, &[53, 9, 1]);
        assert!(DhcpPacket::parse(&data).is_err());
    }

    #[test]
    fn test_plain_bootp_has_no_message_type() {
        let data = vec![0u8; BOOTP_HEADER_SIZE];
        let packet = DhcpPacket::parse(&data).unwrap();
        assert_eq!(packet.message_type(), None);
    }
}
