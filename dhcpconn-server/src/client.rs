//! Contract of the DHCP server control clients

use crate::ServerRole;
use async_trait::async_trait;
use dhcpconn_core::{protocol_constants::STATUS_OK, Error, MacAddr, Result, SubnetRange};
use std::fmt;
use std::net::Ipv4Addr;

/// Reply to a control call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub code: u16,
    pub message: String,
}

impl Response {
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Successful reply with an empty message
    pub fn ok() -> Self {
        Self::new(STATUS_OK, "")
    }

    pub fn is_ok(&self) -> bool {
        self.code == STATUS_OK
    }

    /// Server state carried in a status reply
    pub fn server_state(&self) -> ServerState {
        ServerState::from_message(&self.message)
    }
}

/// Reply to a range query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeResponse {
    pub code: u16,
    pub start: String,
    pub end: String,
}

impl RangeResponse {
    pub fn new(code: u16, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            code,
            start: start.into(),
            end: end.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == STATUS_OK
    }

    /// The reported range, when the call succeeded and both bounds parse
    pub fn range(&self) -> Result<SubnetRange> {
        if !self.is_ok() {
            return Err(Error::client(
                ServerRole::Primary.to_string(),
                format!("range query returned code {}", self.code),
            ));
        }
        SubnetRange::parse(&self.start, &self.end)
    }

    /// Whether this reply reports exactly `range`
    pub fn matches(&self, range: &SubnetRange) -> bool {
        self.range().map(|r| r == *range).unwrap_or(false)
    }
}

/// Run state reported by a DHCP server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerState {
    Running,
    Stopped,
    /// Message that carried no recognizable state word
    Unknown(String),
}

impl ServerState {
    /// Read the state from whole words of `message`.
    ///
    /// A running word preceded by `not` or `no` reads as stopped.
    pub fn from_message(message: &str) -> Self {
        let lower = message.to_ascii_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_ascii_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        let mut running = false;
        for (i, word) in words.iter().enumerate() {
            match *word {
                "stopped" | "inactive" | "dead" | "down" => return ServerState::Stopped,
                "running" | "started" | "active" | "up" => {
                    if i > 0 && matches!(words[i - 1], "not" | "no") {
                        return ServerState::Stopped;
                    }
                    running = true;
                }
                _ => {}
            }
        }

        if running {
            ServerState::Running
        } else {
            ServerState::Unknown(message.to_string())
        }
    }
}

impl fmt::Display for ServerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerState::Running => write!(f, "running"),
            ServerState::Stopped => write!(f, "stopped"),
            ServerState::Unknown(msg) => write!(f, "unknown ({})", msg),
        }
    }
}

/// Control interface of one DHCP server.
///
/// `Err` means the server could not be reached; an answer with a non-200
/// code is `Ok` and left to the caller to judge.
#[async_trait]
pub trait DhcpServerClient: Send + Sync {
    async fn get_dhcp_range(&self) -> Result<RangeResponse>;

    async fn set_dhcp_range(&self, start: Ipv4Addr, end: Ipv4Addr) -> Result<Response>;

    /// Lease held by `mac`; the message is a JSON lease record
    async fn get_lease(&self, mac: &MacAddr) -> Result<Response>;

    async fn add_reserved_lease(
        &self,
        hostname: &str,
        mac: &MacAddr,
        ip: Ipv4Addr,
    ) -> Result<Response>;

    async fn delete_reserved_lease(&self, mac: &MacAddr) -> Result<Response>;

    async fn enable_failover(&self) -> Result<Response>;

    async fn disable_failover(&self) -> Result<Response>;

    async fn start_dhcp_server(&self) -> Result<Response>;

    async fn stop_dhcp_server(&self) -> Result<Response>;

    /// Status; the message names the server state
    async fn get_status(&self) -> Result<Response>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_ok() {
        assert!(Response::ok().is_ok());
        assert!(!Response::new(500, "boom").is_ok());
    }

    #[test]
    fn test_server_state_from_message() {
        assert_eq!(ServerState::from_message("running"), ServerState::Running);
        assert_eq!(ServerState::from_message("DHCP server started"), ServerState::Running);
        assert_eq!(ServerState::from_message("Stopped"), ServerState::Stopped);
        assert_eq!(ServerState::from_message("inactive"), ServerState::Stopped);
        assert_eq!(
            ServerState::from_message("active (running)"),
            ServerState::Running
        );
        assert_eq!(
            ServerState::from_message("DHCP server is not running"),
            ServerState::Stopped
        );
        assert_eq!(
            ServerState::from_message("OK"),
            ServerState::Unknown("OK".to_string())
        );
        assert_eq!(
            ServerState::from_message("???"),
            ServerState::Unknown("???".to_string())
        );
    }

    #[test]
    fn test_range_response_matches_numerically() {
        let range = SubnetRange::parse("10.10.10.2", "10.10.10.254").unwrap();
        assert!(RangeResponse::new(200, "10.10.10.2", "10.10.10.254").matches(&range));
        assert!(!RangeResponse::new(200, "10.10.10.2", "10.10.10.253").matches(&range));
        assert!(!RangeResponse::new(500, "10.10.10.2", "10.10.10.254").matches(&range));
        assert!(!RangeResponse::new(200, "garbage", "10.10.10.254").matches(&range));
    }

    #[test]
    fn test_range_response_error_code() {
        let err = RangeResponse::new(404, "", "").range().unwrap_err();
        assert!(matches!(err, Error::Client { .. }));
    }
}
