//! DHCP failover: take PRIMARY down and check the device moves to SECONDARY

use crate::context::ScenarioContext;
use dhcpconn_core::TestOutcome;
use dhcpconn_server::ServerRole;
use tracing::{error, info, warn};

/// Stop PRIMARY, wait out the device's lease and expect SECONDARY to renew it.
///
/// PRIMARY is restarted whenever a stop was attempted, whatever the outcome.
pub async fn run(ctx: ScenarioContext<'_>) -> TestOutcome {
    info!("Running connection.ipaddr.dhcp_failover");

    for role in ServerRole::ALL {
        if !ctx.coordinator.server_reachable(role).await {
            warn!(%role, "DHCP server not reachable");
            return TestOutcome::inconclusive("Network is not ready for this test");
        }
    }

    let lease = match ctx.tracker.current_lease(&ctx.device_mac).await {
        Ok(Some(lease)) => lease,
        Ok(None) => return TestOutcome::inconclusive("Device has no current DHCP lease"),
        Err(e) => {
            warn!(error = %e, "Current lease could not be read");
            return TestOutcome::inconclusive("Device has no current DHCP lease");
        }
    };
    info!(%lease, "Current device lease resolved");

    if !ctx.tracker.is_lease_active(&lease).await {
        return TestOutcome::fail("Device did not respond to ping");
    }

    if !ctx.coordinator.stop_role(ServerRole::Primary).await {
        if !ctx.coordinator.start_role(ServerRole::Primary).await {
            error!("Failed to restart primary DHCP server");
        }
        return TestOutcome::inconclusive("Failed to shutdown primary DHCP server");
    }
    info!("Primary DHCP server stopped");

    let outcome = renew_from_secondary(&ctx, &lease).await;

    if !ctx.coordinator.start_role(ServerRole::Primary).await {
        error!("Failed to restart primary DHCP server");
    }
    outcome
}

async fn renew_from_secondary(
    ctx: &ScenarioContext<'_>,
    lease: &dhcpconn_core::Lease,
) -> TestOutcome {
    ctx.tracker.wait_for_expiry(lease).await;

    info!("Checking for new lease from secondary DHCP server");
    let Some(renewed) = ctx
        .tracker
        .poll_for_lease(&ctx.device_mac, ServerRole::Secondary)
        .await
    else {
        return TestOutcome::fail("Device did not recieve a new lease from secondary DHCP server");
    };
    info!(lease = %renewed, "New lease found from secondary");

    if ctx.tracker.is_lease_active(&renewed).await {
        TestOutcome::pass("Secondary DHCP server lease confirmed active in device")
    } else {
        TestOutcome::fail("Could not validate lease is active in device")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{Rig, DEVICE, LEASED};
    use dhcpconn_server::testing::{lease, Call, FakeDhcpServer, FakeProbe};
    use pretty_assertions::assert_eq;
    use std::net::Ipv4Addr;

    const RENEWED: Ipv4Addr = Ipv4Addr::new(10, 10, 10, 15);

    #[tokio::test(start_paused = true)]
    async fn test_secondary_takes_over() {
        let rig = Rig::new(
            FakeDhcpServer::new("primary").with_lease(lease(DEVICE, LEASED, 10)),
            FakeDhcpServer::new("secondary").with_lease(lease(DEVICE, RENEWED, 600)),
            FakeProbe::new().reachable(LEASED).reachable(RENEWED),
        );

        let outcome = run(rig.ctx()).await;

        assert_eq!(
            outcome,
            TestOutcome::pass("Secondary DHCP server lease confirmed active in device")
        );
        assert!(rig.primary.is_running());
        assert_eq!(rig.probe.ping_count(RENEWED), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_lease_from_secondary() {
        let rig = Rig::new(
            FakeDhcpServer::new("primary").with_lease(lease(DEVICE, LEASED, 10)),
            FakeDhcpServer::new("secondary"),
            FakeProbe::new().reachable(LEASED),
        );

        let outcome = run(rig.ctx()).await;

        assert_eq!(
            outcome,
            TestOutcome::fail("Device did not recieve a new lease from secondary DHCP server")
        );
        assert_eq!(rig.primary.call_count(Call::StopDhcpServer), 1);
        assert_eq!(rig.primary.call_count(Call::StartDhcpServer), 1);
        assert!(rig.primary.is_running());
        assert_eq!(rig.secondary.call_count(Call::GetLease), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_renewed_lease_unreachable() {
        let rig = Rig::new(
            FakeDhcpServer::new("primary").with_lease(lease(DEVICE, LEASED, 10)),
            FakeDhcpServer::new("secondary").with_lease(lease(DEVICE, RENEWED, 600)),
            FakeProbe::new().reachable(LEASED),
        );

        let outcome = run(rig.ctx()).await;

        assert_eq!(
            outcome,
            TestOutcome::fail("Could not validate lease is active in device")
        );
        assert!(rig.primary.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_secondary_unreachable() {
        let rig = Rig::new(
            FakeDhcpServer::new("primary").with_lease(lease(DEVICE, LEASED, 10)),
            FakeDhcpServer::new("secondary").failing(Call::GetStatus),
            FakeProbe::new().reachable(LEASED),
        );

        let outcome = run(rig.ctx()).await;

        assert_eq!(
            outcome,
            TestOutcome::inconclusive("Network is not ready for this test")
        );
        assert_eq!(rig.primary.call_count(Call::StopDhcpServer), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_without_state_word_is_reachable() {
        let rig = Rig::new(
            FakeDhcpServer::new("primary")
                .with_lease(lease(DEVICE, LEASED, 10))
                .reporting_status("OK"),
            FakeDhcpServer::new("secondary")
                .with_lease(lease(DEVICE, RENEWED, 600))
                .reporting_status("OK"),
            FakeProbe::new().reachable(LEASED).reachable(RENEWED),
        );

        assert_eq!(
            run(rig.ctx()).await,
            TestOutcome::pass("Secondary DHCP server lease confirmed active in device")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_not_answering() {
        let rig = Rig::new(
            FakeDhcpServer::new("primary").with_lease(lease(DEVICE, LEASED, 10)),
            FakeDhcpServer::new("secondary"),
            FakeProbe::new(),
        );

        let outcome = run(rig.ctx()).await;

        assert_eq!(outcome, TestOutcome::fail("Device did not respond to ping"));
        assert_eq!(rig.primary.call_count(Call::StopDhcpServer), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_primary_refuses_stop() {
        let rig = Rig::new(
            FakeDhcpServer::new("primary")
                .with_lease(lease(DEVICE, LEASED, 10))
                .failing(Call::StopDhcpServer),
            FakeDhcpServer::new("secondary"),
            FakeProbe::new().reachable(LEASED),
        );

        let outcome = run(rig.ctx()).await;

        assert_eq!(
            outcome,
            TestOutcome::inconclusive("Failed to shutdown primary DHCP server")
        );
        assert_eq!(rig.primary.call_count(Call::StartDhcpServer), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_current_lease() {
        let rig = Rig::new(
            FakeDhcpServer::new("primary"),
            FakeDhcpServer::new("secondary"),
            FakeProbe::new(),
        );

        assert_eq!(
            run(rig.ctx()).await,
            TestOutcome::inconclusive("Device has no current DHCP lease")
        );
    }
}
