//! IP change: reserve a new address for the device and check it moves

use crate::context::ScenarioContext;
use dhcpconn_core::{Lease, SubnetRange, TestOutcome};
use dhcpconn_server::ServerRole;
use std::net::{IpAddr, Ipv4Addr};
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Move the device to `target` through a reserved lease.
///
/// The pair is collapsed for the duration and restored to the range it
/// reported beforehand; the reservation is always removed.
pub async fn run(ctx: ScenarioContext<'_>, target: Ipv4Addr) -> TestOutcome {
    info!(%target, "Running connection.ipaddr.ip_change");

    let original = match ctx.coordinator.current_range().await {
        Ok(range) => range,
        Err(e) => {
            error!(error = %e, "Current subnet range could not be read");
            return TestOutcome::inconclusive("Failed to configure network for test");
        }
    };

    let setup = ctx.coordinator.collapse_to_single_server().await;
    if !setup.is_pass() {
        error!(detail = %setup.detail, "DHCP server setup failed");
        return TestOutcome::inconclusive("Failed to configure network for test");
    }

    let outcome = match current_lease(&ctx).await {
        Some(lease) => change_address(&ctx, &lease, target).await,
        None => TestOutcome::inconclusive("Device has no current DHCP lease"),
    };

    restore(&ctx, &original).await;
    outcome
}

async fn current_lease(ctx: &ScenarioContext<'_>) -> Option<Lease> {
    match ctx.tracker.current_lease(&ctx.device_mac).await {
        Ok(Some(lease)) => {
            info!("Current device lease resolved");
            debug!(%lease);
            Some(lease)
        }
        Ok(None) => None,
        Err(e) => {
            warn!(error = %e, "Current lease could not be read");
            None
        }
    }
}

async fn change_address(ctx: &ScenarioContext<'_>, lease: &Lease, target: Ipv4Addr) -> TestOutcome {
    if !ctx
        .coordinator
        .add_reserved_lease(&lease.hostname, &lease.mac_address, target)
        .await
    {
        return TestOutcome::inconclusive("Failed to create reserved lease for device");
    }

    ctx.tracker.wait_for_expiry(lease).await;

    info!("Checking device accepted new ip");
    let outcome = ping_target(ctx, target).await;

    if !ctx.coordinator.delete_reserved_lease(&lease.mac_address).await {
        error!(mac = %lease.mac_address, "Failed to delete reserved lease");
    }
    outcome
}

async fn ping_target(ctx: &ScenarioContext<'_>, target: Ipv4Addr) -> TestOutcome {
    let attempts = ctx.timing.ping_attempts;
    for attempt in 1..=attempts {
        info!(attempt, "Pinging device at IP: {}", target);
        if ctx.probe.ping(IpAddr::V4(target)).await {
            info!("Reserved lease confirmed active in device");
            return TestOutcome::pass("Device has accepted an IP address change");
        }
        info!("Device did not respond to ping");
        if attempt < attempts {
            sleep(ctx.timing.ping_backoff).await;
        }
    }
    TestOutcome::fail("Device did not accept IP address change")
}

async fn restore(ctx: &ScenarioContext<'_>, original: &SubnetRange) {
    if !ctx.coordinator.restore_failover_topology(original).await {
        error!("Failed to restore DHCP failover configuration");
    }

    info!(
        "Waiting {} seconds for reserved lease to expire",
        ctx.timing.post_restore_wait.as_secs()
    );
    sleep(ctx.timing.post_restore_wait).await;

    if ctx
        .tracker
        .poll_for_lease(&ctx.device_mac, ServerRole::Primary)
        .await
        .is_none()
    {
        warn!("Device has not renewed its lease after restoration");
    }
}
