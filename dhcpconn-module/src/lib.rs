//! Connection checks for a device under test
//!
//! [`ConnectionModule`] holds the device identity and the components every
//! check runs against. The checks that reconfigure the network live in
//! [`subnet`] (the subnet sweep) and [`scenario`] (IP change and DHCP
//! failover); each borrows what it needs through a [`ScenarioContext`].

pub mod checks;
pub mod context;
pub mod module;
pub mod scenario;
pub mod subnet;

#[cfg(test)]
mod test_support;

pub use checks::ConnectionCheck;
pub use context::ScenarioContext;
pub use module::ConnectionModule;
pub use subnet::{aggregate, SubnetResult, SubnetTestRunner};
