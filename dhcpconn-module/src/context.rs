//! What a scenario runs against

use dhcpconn_core::{MacAddr, Timing};
use dhcpconn_server::{DhcpRoleCoordinator, LeaseTracker, Probe};

/// Borrowed components and device identity for one scenario run
#[derive(Clone, Copy)]
pub struct ScenarioContext<'a> {
    /// Device under test
    pub device_mac: MacAddr,
    pub coordinator: &'a DhcpRoleCoordinator,
    pub tracker: &'a LeaseTracker,
    pub probe: &'a dyn Probe,
    pub timing: &'a Timing,
}

impl<'a> ScenarioContext<'a> {
    pub fn new(
        device_mac: MacAddr,
        coordinator: &'a DhcpRoleCoordinator,
        tracker: &'a LeaseTracker,
        probe: &'a dyn Probe,
        timing: &'a Timing,
    ) -> Self {
        Self {
            device_mac,
            coordinator,
            tracker,
            probe,
            timing,
        }
    }
}
