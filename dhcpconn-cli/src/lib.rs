//! Command-line front end for dhcpconn
//!
//! Runs the checks that need only the capture files, so a device's
//! startup and monitor captures can be inspected away from the lab.

pub mod args;
pub mod commands;

pub use args::{Cli, Commands};
pub use commands::execute;
