//! Reachability probing

use async_trait::async_trait;
use std::net::IpAddr;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// Single-attempt reachability check
#[async_trait]
pub trait Probe: Send + Sync {
    /// Whether `host` answered one ICMP echo
    async fn ping(&self, host: IpAddr) -> bool;
}

/// Probe backed by the system `ping` binary
#[derive(Debug, Clone)]
pub struct SystemPing {
    program: String,
}

impl SystemPing {
    pub fn new() -> Self {
        Self {
            program: "ping".to_string(),
        }
    }

    /// Use a different ping binary
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }
}

impl Default for SystemPing {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Probe for SystemPing {
    async fn ping(&self, host: IpAddr) -> bool {
        let target = host.to_string();
        let result = Command::new(&self.program)
            .args(["-c", "1"])
            .arg(&target)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match result {
            Ok(status) => {
                debug!(%host, success = status.success(), "ping finished");
                status.success()
            }
            Err(e) => {
                debug!(%host, error = %e, "ping could not be run");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn test_missing_binary_is_unreachable() {
        let probe = SystemPing::new().with_program("/nonexistent/dhcpconn-ping");
        assert!(!probe.ping(IpAddr::V4(Ipv4Addr::LOCALHOST)).await);
    }

    #[tokio::test]
    async fn test_exit_status_decides() {
        let probe = SystemPing::new().with_program("true");
        assert!(probe.ping(IpAddr::V4(Ipv4Addr::LOCALHOST)).await);

        let probe = SystemPing::new().with_program("false");
        assert!(!probe.ping(IpAddr::V4(Ipv4Addr::LOCALHOST)).await);
    }
}
