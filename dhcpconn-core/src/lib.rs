//! dhcpconn core library
//!
//! Shared types for the DHCP connectivity checks: errors, MAC addresses,
//! subnet ranges with numeric containment, typed leases, check outcomes and
//! module configuration.

pub mod config;
pub mod error;
pub mod lease;
pub mod logging;
pub mod outcome;
pub mod range;
pub mod types;

// Re-export commonly used types
pub use config::{CapturePaths, DeviceConfig, ModuleConfig, Timing};
pub use error::{Error, Result};
pub use lease::{local_now, Lease, EXPIRES_FORMAT};
pub use outcome::{TestOutcome, Verdict};
pub use range::{ip_in_range, ipv4_to_u32, SubnetRange};
pub use types::*;
