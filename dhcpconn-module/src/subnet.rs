//! Subnet sweep: does the device follow the DHCP server onto new ranges?
//!
//! The sweep collapses the pair to PRIMARY, moves PRIMARY through each
//! configured range, and after every move waits out the device's lease and
//! checks that the renewed address lies inside the new range. The original
//! range and the failover pair are restored afterwards on every path once
//! the original range has been read.

use crate::context::ScenarioContext;
use dhcpconn_core::{Lease, SubnetRange, TestOutcome};
use dhcpconn_server::ServerRole;
use tracing::{debug, error, info, warn, Instrument, Span};

/// Result for one range of the sweep
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetResult {
    pub range: SubnetRange,
    pub passed: bool,
    pub detail: String,
}

impl SubnetResult {
    fn verdict(range: &SubnetRange, passed: bool) -> Self {
        let word = if passed { "passed" } else { "failed" };
        Self {
            range: *range,
            passed,
            detail: format!("Subnet {} {}", range, word),
        }
    }

    fn error(range: &SubnetRange, reason: impl std::fmt::Display) -> Self {
        Self {
            range: *range,
            passed: false,
            detail: format!("Subnet test failed: {}", reason),
        }
    }
}

/// Fold per-range results into the sweep outcome.
///
/// A failed sweep lists only the passing ranges.
pub fn aggregate(results: &[SubnetResult]) -> TestOutcome {
    if results.iter().all(|r| r.passed) {
        return TestOutcome::pass("All subnets are supported");
    }

    let passing: Vec<&str> = results
        .iter()
        .filter(|r| r.passed)
        .map(|r| r.detail.as_str())
        .collect();
    if passing.is_empty() {
        return TestOutcome::fail("No subnets are supported");
    }
    TestOutcome::fail(passing.join("\n"))
}

/// Runs the subnet sweep for one device
pub struct SubnetTestRunner<'a> {
    ctx: ScenarioContext<'a>,
    span: Span,
}

impl<'a> SubnetTestRunner<'a> {
    pub fn new(ctx: ScenarioContext<'a>, span: Span) -> Self {
        Self { ctx, span }
    }

    /// Sweep `ranges` in order
    pub async fn run(&self, ranges: Option<&[SubnetRange]>) -> TestOutcome {
        self.sweep(ranges).instrument(self.span.clone()).await
    }

    async fn sweep(&self, ranges: Option<&[SubnetRange]>) -> TestOutcome {
        let ranges = match ranges {
            Some(ranges) if !ranges.is_empty() => ranges,
            _ => {
                error!("No subnet ranges configured for test. Skipping");
                return TestOutcome::inconclusive("No subnet ranges configured for test");
            }
        };

        let original = match self.ctx.coordinator.current_range().await {
            Ok(range) => range,
            Err(e) => {
                error!(error = %e, "Failed to resolve current subnet range");
                return TestOutcome::inconclusive(
                    "Failed to resolve current subnet range required for restoring network",
                );
            }
        };

        let outcome = self.evaluate(ranges).await;
        self.cleanup(&original).await;
        outcome
    }

    async fn evaluate(&self, ranges: &[SubnetRange]) -> TestOutcome {
        let setup = self.ctx.coordinator.collapse_to_single_server().await;
        if !setup.is_pass() {
            error!(detail = %setup.detail, "DHCP server setup failed");
            return TestOutcome::inconclusive("Failed to setup DHCP server for test");
        }
        info!("{}", setup.detail);

        if !self.device_lease_active().await {
            return TestOutcome::inconclusive(
                "Failed to confirm a valid active lease for the device",
            );
        }

        let mut results = Vec::with_capacity(ranges.len());
        for range in ranges {
            let result = self.test_subnet(range).await;
            info!(range = %range, passed = result.passed, "{}", result.detail);
            results.push(result);
        }
        aggregate(&results)
    }

    async fn device_lease_active(&self) -> bool {
        match self.ctx.tracker.current_lease(&self.ctx.device_mac).await {
            Ok(Some(lease)) => self.ctx.tracker.is_lease_active(&lease).await,
            Ok(None) => {
                warn!("Device has no current lease");
                false
            }
            Err(e) => {
                warn!(error = %e, "Current lease could not be read");
                false
            }
        }
    }

    /// Move PRIMARY to `range` and check where the device renews
    pub async fn test_subnet(&self, range: &SubnetRange) -> SubnetResult {
        let mac = &self.ctx.device_mac;
        let lease = match self.ctx.tracker.current_lease(mac).await {
            Ok(Some(lease)) => lease,
            Ok(None) => return SubnetResult::error(range, format!("no current lease for {}", mac)),
            Err(e) => return SubnetResult::error(range, e),
        };

        if !self.ctx.coordinator.change_range(range).await {
            error!(range = %range, "Failed to change subnet");
            return SubnetResult::verdict(range, false);
        }

        self.ctx.tracker.wait_for_expiry(&lease).await;
        info!("Current lease expired. Checking for new lease");

        let passed = match self.ctx.tracker.poll_for_lease(mac, ServerRole::Primary).await {
            Some(renewed) => {
                let in_range = range.contains(renewed.ip_address);
                info!(ip = %renewed.ip_address, in_range, "Validating subnet for new lease");
                in_range
            }
            None => false,
        };
        SubnetResult::verdict(range, passed)
    }

    /// Restore `original` and the failover pair, then wait for the device to
    /// settle on a lease again. Failures are logged only.
    async fn cleanup(&self, original: &SubnetRange) {
        if !self.ctx.coordinator.restore_failover_topology(original).await {
            error!("Failed to restore DHCP server configuration");
        }

        let mac = &self.ctx.device_mac;
        match self.ctx.tracker.current_lease(mac).await {
            Ok(Some(lease)) => self.ctx.tracker.wait_for_expiry(&lease).await,
            Ok(None) => debug!("No lease to wait out"),
            Err(e) => warn!(error = %e, "Current lease could not be read"),
        }

        match self.ctx.tracker.poll_for_lease(mac, ServerRole::Primary).await {
            Some(lease) => log_restored_lease(&lease, original),
            None => warn!("Device has not renewed its lease after restoration"),
        }
    }
}

fn log_restored_lease(lease: &Lease, original: &SubnetRange) {
    debug!(
        ip = %lease.ip_address,
        in_range = original.contains(lease.ip_address),
        "Lease within subnet"
    );
}
