//! DHCP lease records as reported by a DHCP server

use crate::range::parse_ipv4;
use crate::{Error, MacAddr, Result};
use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use std::fmt;
use std::net::Ipv4Addr;
use std::time::Duration;

/// Timestamp format of the `expires` field
pub const EXPIRES_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current local wall-clock time, the clock lease expiry is expressed in
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// A lease held by one device, as observed at one point in time.
///
/// Never mutated: a renewal is observed as a new `Lease` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lease {
    pub mac_address: MacAddr,
    pub ip_address: Ipv4Addr,
    pub hostname: String,
    pub expires_at: NaiveDateTime,
}

/// Wire shape of a lease payload
#[derive(Debug, Default, Deserialize)]
struct LeaseRecord {
    ip: Option<String>,
    hostname: Option<String>,
    hw_addr: Option<String>,
    expires: Option<String>,
}

impl LeaseRecord {
    fn is_empty(&self) -> bool {
        self.ip.is_none() && self.hostname.is_none() && self.hw_addr.is_none() && self.expires.is_none()
    }
}

impl Lease {
    /// Decode the message body of a lease query for `mac`.
    ///
    /// An empty body or empty object means the server holds no lease for the
    /// device and yields `Ok(None)`. A body that is not a JSON object, or an
    /// object missing `ip`/`expires`, is a decode error.
    pub fn decode(message: &str, mac: MacAddr) -> Result<Option<Self>> {
        let message = message.trim();
        if message.is_empty() {
            return Ok(None);
        }

        let record: LeaseRecord = serde_json::from_str(message)
            .map_err(|e| Error::LeaseDecode(format!("{}: {:?}", e, message)))?;
        if record.is_empty() {
            return Ok(None);
        }

        let ip = record
            .ip
            .ok_or_else(|| Error::LeaseDecode("lease has no 'ip' field".to_string()))?;
        let ip_address = parse_ipv4(&ip)
            .map_err(|e| Error::LeaseDecode(format!("bad 'ip' value: {}", e)))?;

        let expires = record
            .expires
            .ok_or_else(|| Error::LeaseDecode("lease has no 'expires' field".to_string()))?;
        let expires_at = NaiveDateTime::parse_from_str(expires.trim(), EXPIRES_FORMAT)
            .map_err(|e| Error::LeaseDecode(format!("bad 'expires' value {:?}: {}", expires, e)))?;

        let mac_address = match record.hw_addr {
            Some(hw_addr) => hw_addr
                .parse::<MacAddr>()
                .map_err(|e| Error::LeaseDecode(format!("bad 'hw_addr' value: {}", e)))?,
            None => mac,
        };

        Ok(Some(Self {
            mac_address,
            ip_address,
            hostname: record.hostname.unwrap_or_default(),
            expires_at,
        }))
    }

    /// Time left until expiry relative to `now`; zero once expired
    pub fn time_to_expire(&self, now: NaiveDateTime) -> Duration {
        (self.expires_at - now).to_std().unwrap_or(Duration::ZERO)
    }

    /// Whether the lease has expired at `now`
    pub fn is_expired(&self, now: NaiveDateTime) -> bool {
        self.expires_at <= now
    }
}

impl fmt::Display for Lease {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} ({}) expires {}",
            self.mac_address,
            self.ip_address,
            self.hostname,
            self.expires_at.format(EXPIRES_FORMAT)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn device() -> MacAddr {
        "02:42:ac:11:00:02".parse().unwrap()
    }

    #[test]
    fn test_decode_full_lease() {
        let message = r#"{"ip": "10.10.10.14", "hostname": "dut", "hw_addr": "02:42:ac:11:00:02", "expires": "2024-03-01 12:30:05"}"#;
        let lease = Lease::decode(message, device()).unwrap().unwrap();

        assert_eq!(lease.ip_address, Ipv4Addr::new(10, 10, 10, 14));
        assert_eq!(lease.hostname, "dut");
        assert_eq!(lease.mac_address, device());
        assert_eq!(
            lease.expires_at,
            NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, 30, 5)
                .unwrap()
        );
    }

    #[test]
    fn test_decode_empty_means_no_lease() {
        assert!(Lease::decode("", device()).unwrap().is_none());
        assert!(Lease::decode("{}", device()).unwrap().is_none());
    }

    #[test]
    fn test_decode_defaults_mac_and_hostname() {
        let message = r#"{"ip": "10.10.10.14", "expires": "2024-03-01 12:30:05"}"#;
        let lease = Lease::decode(message, device()).unwrap().unwrap();
        assert_eq!(lease.mac_address, device());
        assert_eq!(lease.hostname, "");
    }

    #[test]
    fn test_decode_rejects_malformed() {
        // single-quoted mappings are not JSON
        assert!(Lease::decode("{'ip': '10.10.10.14'}", device()).is_err());
        assert!(Lease::decode(r#"{"ip": "10.10.10.14"}"#, device()).is_err());
        assert!(Lease::decode(
            r#"{"ip": "10.10.10.400", "expires": "2024-03-01 12:30:05"}"#,
            device()
        )
        .is_err());
        assert!(Lease::decode(
            r#"{"ip": "10.10.10.4", "expires": "03/01/2024"}"#,
            device()
        )
        .is_err());
        assert!(Lease::decode("[1, 2]", device()).is_err());
    }

    #[test]
    fn test_decode_bad_addresses_are_decode_errors() {
        let bad_ip = Lease::decode(
            r#"{"ip": "10.10.10.400", "expires": "2024-03-01 12:30:05"}"#,
            device(),
        );
        assert!(matches!(bad_ip, Err(Error::LeaseDecode(_))));

        let bad_mac = Lease::decode(
            r#"{"ip": "10.10.10.4", "hw_addr": "02:42", "expires": "2024-03-01 12:30:05"}"#,
            device(),
        );
        assert!(matches!(bad_mac, Err(Error::LeaseDecode(_))));
    }

    #[test]
    fn test_time_to_expire() {
        let lease = Lease {
            mac_address: device(),
            ip_address: Ipv4Addr::new(10, 10, 10, 14),
            hostname: String::new(),
            expires_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                .unwrap()
                .and_hms_opt(12, 0, 30)
                .unwrap(),
        };
        let before = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let after = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 1, 0)
            .unwrap();

        assert_eq!(lease.time_to_expire(before), Duration::from_secs(30));
        assert_eq!(lease.time_to_expire(after), Duration::ZERO);
        assert!(!lease.is_expired(before));
        assert!(lease.is_expired(after));
    }
}
