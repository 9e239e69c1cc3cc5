//! DHCP server pair control for dhcpconn
//!
//! - [`DhcpServerClient`]: the control API of one DHCP server
//! - [`DhcpRoleCoordinator`]: collapses the failover pair to one server and
//!   restores it afterwards
//! - [`LeaseTracker`]: reads a device's lease and waits on its clock
//! - [`Probe`]: reachability checks, [`SystemPing`] by default

pub mod client;
pub mod coordinator;
pub mod lease_tracker;
pub mod probe;
pub mod role;
pub mod topology;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::{DhcpServerClient, RangeResponse, Response, ServerState};
pub use coordinator::DhcpRoleCoordinator;
pub use lease_tracker::LeaseTracker;
pub use probe::{Probe, SystemPing};
pub use role::{ServerPair, ServerRole};
pub use topology::ServerTopology;
