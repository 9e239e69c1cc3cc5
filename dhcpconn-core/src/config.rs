//! Connection module configuration
//!
//! Loaded from JSON. Every field has a default so a partial file (or `{}`)
//! is valid; checks that need a missing value report INCONCLUSIVE.

use crate::{Error, MacAddr, Result, SubnetRange};
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Capture written during device startup
pub const DEFAULT_STARTUP_CAPTURE: &str = "/runtime/device/startup.pcap";

/// Capture written during the monitoring period
pub const DEFAULT_MONITOR_CAPTURE: &str = "/runtime/device/monitor.pcap";

/// Prefix the lab router advertises for SLAAC
pub const DEFAULT_SLAAC_PREFIX: &str = "fd10:77be:4186";

/// MAC prefix of the test harness containers
pub const DEFAULT_HARNESS_MAC_PREFIX: &str = "9a:02:57:1e:8f:";

/// The device under test
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    pub mac: Option<MacAddr>,
    pub ipv4: Option<Ipv4Addr>,
}

/// Locations of the two capture files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CapturePaths {
    pub startup: PathBuf,
    pub monitor: PathBuf,
}

impl Default for CapturePaths {
    fn default() -> Self {
        Self {
            startup: PathBuf::from(DEFAULT_STARTUP_CAPTURE),
            monitor: PathBuf::from(DEFAULT_MONITOR_CAPTURE),
        }
    }
}

/// Waits, poll budgets and retry counts. Durations are seconds in JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Padding added after a lease's expiry before acting on it
    #[serde(with = "secs")]
    pub lease_grace: Duration,
    /// Delay between lease polls
    #[serde(with = "secs")]
    pub poll_interval: Duration,
    /// Number of lease polls before giving up
    pub poll_attempts: u32,
    /// Delay between stopping a server and querying its status
    #[serde(with = "secs")]
    pub settle_delay: Duration,
    /// Number of status queries while confirming a stop
    pub status_attempts: u32,
    /// Number of pings of a newly reserved address
    pub ping_attempts: u32,
    /// Delay between those pings
    #[serde(with = "secs")]
    pub ping_backoff: Duration,
    /// Wait after restoring servers before requesting a fresh lease
    #[serde(with = "secs")]
    pub post_restore_wait: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            lease_grace: Duration::from_secs(5),
            poll_interval: Duration::from_secs(5),
            poll_attempts: 5,
            settle_delay: Duration::from_secs(3),
            status_attempts: 3,
            ping_attempts: 5,
            ping_backoff: Duration::from_secs(5),
            post_restore_wait: Duration::from_secs(30),
        }
    }
}

/// Configuration of the connection module
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleConfig {
    pub device: DeviceConfig,
    pub captures: CapturePaths,
    /// Ordered subnet ranges for the subnet sweep
    pub ranges: Option<Vec<SubnetRange>>,
    /// Address reserved for the device during the IP change check
    pub ip_change_target: Option<Ipv4Addr>,
    pub slaac_prefix: String,
    pub harness_mac_prefix: String,
    pub timing: Timing,
}

impl Default for ModuleConfig {
    fn default() -> Self {
        Self {
            device: DeviceConfig::default(),
            captures: CapturePaths::default(),
            ranges: None,
            ip_change_target: None,
            slaac_prefix: DEFAULT_SLAAC_PREFIX.to_string(),
            harness_mac_prefix: DEFAULT_HARNESS_MAC_PREFIX.to_string(),
            timing: Timing::default(),
        }
    }
}

impl ModuleConfig {
    /// Parse a configuration from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Reject values that would make every poll loop degenerate
    pub fn validate(&self) -> Result<()> {
        if self.timing.poll_attempts == 0 {
            return Err(Error::config("timing.poll_attempts must be at least 1"));
        }
        if self.timing.status_attempts == 0 {
            return Err(Error::config("timing.status_attempts must be at least 1"));
        }
        if self.timing.ping_attempts == 0 {
            return Err(Error::config("timing.ping_attempts must be at least 1"));
        }
        if matches!(&self.ranges, Some(ranges) if ranges.is_empty()) {
            return Err(Error::config("ranges must not be empty when present"));
        }
        Ok(())
    }
}

mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}
