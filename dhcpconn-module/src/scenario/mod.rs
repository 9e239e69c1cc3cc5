//! Scenarios that provoke a network change and watch the device react

pub mod failover;
pub mod ip_change;

pub use failover::run as dhcp_failover;
pub use ip_change::run as ip_change;
