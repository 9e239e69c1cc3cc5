//! Names of the connection checks

use dhcpconn_core::Error;
use std::fmt;
use std::str::FromStr;

/// One connection check, named as the test harness names it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionCheck {
    PrivateAddress,
    SharedAddress,
    DhcpAddress,
    MacAddress,
    SingleIp,
    TargetPing,
    IpChange,
    DhcpFailover,
    Ipv6Slaac,
    Ipv6Ping,
}

impl ConnectionCheck {
    pub const ALL: [ConnectionCheck; 10] = [
        ConnectionCheck::PrivateAddress,
        ConnectionCheck::SharedAddress,
        ConnectionCheck::DhcpAddress,
        ConnectionCheck::MacAddress,
        ConnectionCheck::SingleIp,
        ConnectionCheck::TargetPing,
        ConnectionCheck::IpChange,
        ConnectionCheck::DhcpFailover,
        ConnectionCheck::Ipv6Slaac,
        ConnectionCheck::Ipv6Ping,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionCheck::PrivateAddress => "connection.private_address",
            ConnectionCheck::SharedAddress => "connection.shared_address",
            ConnectionCheck::DhcpAddress => "connection.dhcp_address",
            ConnectionCheck::MacAddress => "connection.mac_address",
            ConnectionCheck::SingleIp => "connection.single_ip",
            ConnectionCheck::TargetPing => "connection.target_ping",
            ConnectionCheck::IpChange => "connection.ipaddr.ip_change",
            ConnectionCheck::DhcpFailover => "connection.ipaddr.dhcp_failover",
            ConnectionCheck::Ipv6Slaac => "connection.ipv6_slaac",
            ConnectionCheck::Ipv6Ping => "connection.ipv6_ping",
        }
    }

    /// Checks that reconfigure the DHCP servers while they run
    pub fn reconfigures_network(&self) -> bool {
        matches!(
            self,
            ConnectionCheck::PrivateAddress
                | ConnectionCheck::SharedAddress
                | ConnectionCheck::IpChange
                | ConnectionCheck::DhcpFailover
        )
    }
}

impl fmt::Display for ConnectionCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConnectionCheck {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConnectionCheck::ALL
            .into_iter()
            .find(|check| check.as_str() == s)
            .ok_or_else(|| Error::config(format!("Unknown connection check: {}", s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_parse_back() {
        for check in ConnectionCheck::ALL {
            assert_eq!(check.to_string().parse::<ConnectionCheck>().unwrap(), check);
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!("connection.dns".parse::<ConnectionCheck>().is_err());
        assert!("single_ip".parse::<ConnectionCheck>().is_err());
    }

    #[test]
    fn test_network_checks() {
        assert!(ConnectionCheck::DhcpFailover.reconfigures_network());
        assert!(!ConnectionCheck::SingleIp.reconfigures_network());
    }
}
