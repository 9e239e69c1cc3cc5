//! Observing one device's lease across expiry, renewal and failover

use crate::probe::Probe;
use crate::role::{ServerPair, ServerRole};
use dhcpconn_core::{local_now, Lease, MacAddr, Result, Timing, EXPIRES_FORMAT};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, instrument, warn, Span};

/// Reads leases from the server pair and waits on their clocks
pub struct LeaseTracker {
    servers: ServerPair,
    probe: Arc<dyn Probe>,
    timing: Timing,
    span: Span,
}

impl LeaseTracker {
    pub fn new(servers: ServerPair, probe: Arc<dyn Probe>, span: Span) -> Self {
        Self {
            servers,
            probe,
            timing: Timing::default(),
            span,
        }
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Lease the authoritative server holds for `mac`.
    ///
    /// `Ok(None)` when there is no lease record or the server answered with
    /// an error code. No retries.
    pub async fn current_lease(&self, mac: &MacAddr) -> Result<Option<Lease>> {
        self.lease_from(ServerRole::Primary, mac).await
    }

    /// Lease held by `role` for `mac`
    #[instrument(parent = &self.span, skip_all, fields(role = %role, mac = %mac))]
    pub async fn lease_from(&self, role: ServerRole, mac: &MacAddr) -> Result<Option<Lease>> {
        debug!("Checking current device lease");
        let response = self.servers.client(role).get_lease(mac).await?;
        if !response.is_ok() {
            debug!(code = response.code, "No lease reported");
            return Ok(None);
        }
        let lease = Lease::decode(&response.message, *mac)?;
        if let Some(lease) = &lease {
            debug!(%lease, "Lease resolved");
        }
        Ok(lease)
    }

    /// Sleep until `lease` has expired plus the grace period.
    ///
    /// Returns at once for a lease that has already expired.
    #[instrument(parent = &self.span, skip_all, fields(ip = %lease.ip_address))]
    pub async fn wait_for_expiry(&self, lease: &Lease) {
        let remaining = lease.time_to_expire(local_now());
        info!(
            "Waiting for current lease to expire: {}",
            lease.expires_at.format(EXPIRES_FORMAT)
        );
        if remaining.is_zero() {
            debug!("Lease already expired");
            return;
        }
        debug!(?remaining, "Time until lease expiration");
        sleep(remaining + self.timing.lease_grace).await;
        info!("Current lease expired");
    }

    /// Poll `role` for a lease for `mac` until `timeout`, every `poll_interval`.
    ///
    /// Any lease counts, including one that looks identical to the last.
    pub async fn wait_for_new_lease(
        &self,
        mac: &MacAddr,
        role: ServerRole,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Option<Lease> {
        let interval_ms = poll_interval.as_millis().max(1);
        let attempts = u32::try_from(timeout.as_millis() / interval_ms)
            .unwrap_or(u32::MAX)
            .max(1);
        self.poll(mac, role, attempts, poll_interval).await
    }

    /// Poll `role` `poll_attempts` times, `poll_interval` apart
    pub async fn poll_for_lease(&self, mac: &MacAddr, role: ServerRole) -> Option<Lease> {
        self.poll(
            mac,
            role,
            self.timing.poll_attempts.max(1),
            self.timing.poll_interval,
        )
        .await
    }

    #[instrument(parent = &self.span, skip_all, fields(role = %role, mac = %mac, attempts = attempts))]
    async fn poll(
        &self,
        mac: &MacAddr,
        role: ServerRole,
        attempts: u32,
        poll_interval: Duration,
    ) -> Option<Lease> {
        for attempt in 1..=attempts {
            info!(attempt, "Checking for new lease");
            match self.lease_from(role, mac).await {
                Ok(Some(lease)) => {
                    info!(%lease, "New lease found");
                    return Some(lease);
                }
                Ok(None) => info!("New lease not found. Waiting to check again"),
                Err(e) => warn!(error = %e, "Lease query failed"),
            }
            if attempt < attempts {
                sleep(poll_interval).await;
            }
        }
        None
    }

    /// Whether the device answers a ping at the lease's address.
    ///
    /// Reachability stands in for the lease being in use; the server's own
    /// lease state is not consulted.
    #[instrument(parent = &self.span, skip_all, fields(ip = %lease.ip_address))]
    pub async fn is_lease_active(&self, lease: &Lease) -> bool {
        info!("Attempting to ping device...");
        let reachable = self.probe.ping(IpAddr::V4(lease.ip_address)).await;
        info!(reachable, "Ping finished");
        reachable
    }
}
