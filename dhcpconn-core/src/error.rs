//! Error types for dhcpconn

use thiserror::Error;

/// Result type alias for dhcpconn operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for dhcpconn
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error (config files, probe process)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed dotted-quad, MAC or IPv6 address
    #[error("Invalid address '{value}': {reason}")]
    InvalidAddress { value: String, reason: String },

    /// Lease payload from a DHCP server could not be decoded
    #[error("Lease decode error: {0}")]
    LeaseDecode(String),

    /// A DHCP server client call failed at the transport level
    #[error("DHCP server '{role}' error: {reason}")]
    Client { role: String, reason: String },

    /// Capture file could not be read
    #[error("Packet capture error: {0}")]
    Capture(String),

    /// Captured frame could not be decoded
    #[error("Packet parsing error: {0}")]
    PacketParsing(String),
}

impl Error {
    /// Create a configuration error with a custom message
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Create an invalid address error
    pub fn invalid_address<S: Into<String>, R: Into<String>>(value: S, reason: R) -> Self {
        Error::InvalidAddress {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create a client transport error for the given server role
    pub fn client<S: Into<String>, R: Into<String>>(role: S, reason: R) -> Self {
        Error::Client {
            role: role.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Config(err.to_string())
    }
}
