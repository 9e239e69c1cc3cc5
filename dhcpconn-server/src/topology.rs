//! Tracked state of the DHCP server pair

use crate::ServerRole;
use dhcpconn_core::SubnetRange;
use std::fmt;

/// Which servers run, whether PRIMARY is in failover, and the range last
/// confirmed on PRIMARY.
///
/// Every scenario starts from and returns to [`ServerTopology::baseline`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerTopology {
    pub primary_running: bool,
    pub secondary_running: bool,
    pub failover_enabled: bool,
    pub active_range: Option<SubnetRange>,
}

impl ServerTopology {
    /// Both servers running as a failover pair
    pub fn baseline() -> Self {
        Self {
            primary_running: true,
            secondary_running: true,
            failover_enabled: true,
            active_range: None,
        }
    }

    /// Whether the run state matches the dual failover baseline
    pub fn is_baseline(&self) -> bool {
        self.primary_running && self.secondary_running && self.failover_enabled
    }

    /// Exactly one server left to hand out addresses
    pub fn is_single_server(&self) -> bool {
        self.primary_running != self.secondary_running
    }

    pub fn is_running(&self, role: ServerRole) -> bool {
        match role {
            ServerRole::Primary => self.primary_running,
            ServerRole::Secondary => self.secondary_running,
        }
    }

    pub fn set_running(&mut self, role: ServerRole, running: bool) {
        match role {
            ServerRole::Primary => self.primary_running = running,
            ServerRole::Secondary => self.secondary_running = running,
        }
    }
}

impl Default for ServerTopology {
    fn default() -> Self {
        Self::baseline()
    }
}

impl fmt::Display for ServerTopology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = |running| if running { "up" } else { "down" };
        write!(
            f,
            "PRIMARY {}, SECONDARY {}, failover {}",
            state(self.primary_running),
            state(self.secondary_running),
            if self.failover_enabled { "on" } else { "off" }
        )?;
        if let Some(range) = self.active_range {
            write!(f, ", range {}", range)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_baseline() {
        let topology = ServerTopology::baseline();
        assert!(topology.is_baseline());
        assert!(!topology.is_single_server());
        assert_eq!(topology, ServerTopology::default());
    }

    #[test]
    fn test_collapsed() {
        let mut topology = ServerTopology::baseline();
        topology.set_running(ServerRole::Secondary, false);

        assert!(!topology.is_baseline());
        assert!(topology.is_single_server());
        assert!(topology.is_running(ServerRole::Primary));
        assert_eq!(
            topology.to_string(),
            "PRIMARY up, SECONDARY down, failover on"
        );
    }
}
