//! Moves the DHCP server pair between the dual failover baseline and the
//! single-server layouts the scenarios need.
//!
//! Every operation is best effort: a failed step ends the operation and is
//! reported through its return value, never raised.

use crate::client::{Response, ServerState};
use crate::role::{ServerPair, ServerRole};
use crate::topology::ServerTopology;
use dhcpconn_core::{MacAddr, Result, SubnetRange, TestOutcome, Timing};
use parking_lot::Mutex;
use std::net::Ipv4Addr;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn, Span};

/// Judge a control call; code 200 is success
fn accepted(role: ServerRole, action: &str, result: Result<Response>) -> bool {
    match result {
        Ok(response) if response.is_ok() => {
            debug!(%role, action, "command accepted");
            true
        }
        Ok(response) => {
            warn!(%role, action, code = response.code, message = %response.message, "command rejected");
            false
        }
        Err(e) => {
            warn!(%role, action, error = %e, "command failed");
            false
        }
    }
}

/// Drives role changes on the server pair and tracks the resulting topology
pub struct DhcpRoleCoordinator {
    servers: ServerPair,
    timing: Timing,
    topology: Mutex<ServerTopology>,
    span: Span,
}

impl DhcpRoleCoordinator {
    /// Coordinator assuming the pair starts at the baseline
    pub fn new(servers: ServerPair, span: Span) -> Self {
        Self {
            servers,
            timing: Timing::default(),
            topology: Mutex::new(ServerTopology::baseline()),
            span,
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn servers(&self) -> &ServerPair {
        &self.servers
    }

    /// Snapshot of the tracked topology
    pub fn topology(&self) -> ServerTopology {
        *self.topology.lock()
    }

    #[instrument(parent = &self.span, skip_all, fields(role = %role))]
    pub async fn stop_role(&self, role: ServerRole) -> bool {
        let ok = accepted(role, "stop", self.servers.client(role).stop_dhcp_server().await);
        if ok {
            self.topology.lock().set_running(role, false);
        }
        ok
    }

    #[instrument(parent = &self.span, skip_all, fields(role = %role))]
    pub async fn start_role(&self, role: ServerRole) -> bool {
        let ok = accepted(role, "start", self.servers.client(role).start_dhcp_server().await);
        if ok {
            self.topology.lock().set_running(role, true);
        }
        ok
    }

    #[instrument(parent = &self.span, skip_all, fields(role = %role))]
    pub async fn enable_failover(&self, role: ServerRole) -> bool {
        let ok = accepted(
            role,
            "enable failover",
            self.servers.client(role).enable_failover().await,
        );
        if ok && role == ServerRole::Primary {
            self.topology.lock().failover_enabled = true;
        }
        ok
    }

    #[instrument(parent = &self.span, skip_all, fields(role = %role))]
    pub async fn disable_failover(&self, role: ServerRole) -> bool {
        let ok = accepted(
            role,
            "disable failover",
            self.servers.client(role).disable_failover().await,
        );
        if ok && role == ServerRole::Primary {
            self.topology.lock().failover_enabled = false;
        }
        ok
    }

    /// Reported state of `role`; `None` when the status query failed
    #[instrument(parent = &self.span, skip_all, fields(role = %role))]
    pub async fn server_status(&self, role: ServerRole) -> Option<ServerState> {
        match self.servers.client(role).get_status().await {
            Ok(response) if response.is_ok() => {
                let state = response.server_state();
                debug!(%state, "status");
                Some(state)
            }
            Ok(response) => {
                warn!(code = response.code, "status query rejected");
                None
            }
            Err(e) => {
                warn!(error = %e, "status query failed");
                None
            }
        }
    }

    /// Whether `role` answers status queries with code 200
    pub async fn server_reachable(&self, role: ServerRole) -> bool {
        self.server_status(role).await.is_some()
    }

    /// Range currently configured on the authoritative server
    #[instrument(parent = &self.span, skip_all)]
    pub async fn current_range(&self) -> Result<SubnetRange> {
        let range = self.servers.authoritative().get_dhcp_range().await?.range()?;
        info!(%range, "Current DHCP subnet range");
        self.topology.lock().active_range = Some(range);
        Ok(range)
    }

    /// Apply `range` to the authoritative server and confirm it by reading it back
    #[instrument(parent = &self.span, skip_all, fields(range = %range))]
    pub async fn change_range(&self, range: &SubnetRange) -> bool {
        info!("Changing subnet");
        let client = self.servers.authoritative();
        if !accepted(
            ServerRole::Primary,
            "set range",
            client.set_dhcp_range(range.start, range.end).await,
        ) {
            debug!("Subnet change request failed");
            return false;
        }

        match client.get_dhcp_range().await {
            Ok(reported) if reported.matches(range) => {
                debug!("Subnet change confirmed");
                self.topology.lock().active_range = Some(*range);
                true
            }
            Ok(reported) => {
                debug!(
                    code = reported.code,
                    start = %reported.start,
                    end = %reported.end,
                    "Failed to confirm subnet change"
                );
                false
            }
            Err(e) => {
                debug!(error = %e, "Failed to confirm subnet change");
                false
            }
        }
    }

    /// Reserve `ip` for the device on the authoritative server
    #[instrument(parent = &self.span, skip_all, fields(mac = %mac, ip = %ip))]
    pub async fn add_reserved_lease(&self, hostname: &str, mac: &MacAddr, ip: Ipv4Addr) -> bool {
        accepted(
            ServerRole::Primary,
            "add reserved lease",
            self.servers
                .authoritative()
                .add_reserved_lease(hostname, mac, ip)
                .await,
        )
    }

    #[instrument(parent = &self.span, skip_all, fields(mac = %mac))]
    pub async fn delete_reserved_lease(&self, mac: &MacAddr) -> bool {
        accepted(
            ServerRole::Primary,
            "delete reserved lease",
            self.servers.authoritative().delete_reserved_lease(mac).await,
        )
    }

    /// Stop SECONDARY and wait until its status no longer reads running.
    ///
    /// A 200 status without a state word counts as stopped.
    #[instrument(parent = &self.span, skip_all)]
    pub async fn collapse_to_single_server(&self) -> TestOutcome {
        info!("Stopping secondary DHCP server");
        if !self.stop_role(ServerRole::Secondary).await {
            return TestOutcome::fail("DHCP server stop command failed");
        }
        info!("Secondary DHCP server stop command success");

        for attempt in 1..=self.timing.status_attempts {
            sleep(self.timing.settle_delay).await;
            info!(attempt, "Checking secondary DHCP server status");
            match self.server_status(ServerRole::Secondary).await {
                Some(ServerState::Running) | None => {
                    debug!(attempt, "Secondary DHCP server not confirmed stopped")
                }
                Some(state) => {
                    info!(%state, "Secondary DHCP server stopped");
                    return TestOutcome::pass("Single DHCP server configured");
                }
            }
        }

        self.topology.lock().set_running(ServerRole::Secondary, true);
        error!("Secondary DHCP server still running after stop");
        TestOutcome::fail("DHCP server still running")
    }

    /// Re-apply `range`, re-enable failover on PRIMARY and start SECONDARY.
    ///
    /// `false` means the pair may be left inconsistent.
    #[instrument(parent = &self.span, skip_all, fields(range = %range))]
    pub async fn restore_failover_topology(&self, range: &SubnetRange) -> bool {
        if !self.change_range(range).await {
            error!("Failed to restore original subnet");
            return false;
        }
        if !self.enable_failover(ServerRole::Primary).await {
            error!("Failed to enable failover in primary DHCP server");
            return false;
        }
        if !self.start_role(ServerRole::Secondary).await {
            error!("Failed to start secondary DHCP server");
            return false;
        }
        info!(topology = %self.topology(), "DHCP server configuration restored");
        true
    }
}
