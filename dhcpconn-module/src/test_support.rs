//! Fake server pair and probe wired into real components

use crate::context::ScenarioContext;
use dhcpconn_core::{MacAddr, Timing};
use dhcpconn_server::testing::{FakeDhcpServer, FakeProbe};
use dhcpconn_server::{DhcpRoleCoordinator, LeaseTracker, Probe, ServerPair};
use std::net::Ipv4Addr;
use std::sync::Arc;
use tracing::Span;

pub const DEVICE: MacAddr = MacAddr::new([0x02, 0x42, 0xAC, 0x11, 0x00, 0x02]);
pub const LEASED: Ipv4Addr = Ipv4Addr::new(10, 10, 10, 14);

pub struct Rig {
    pub primary: Arc<FakeDhcpServer>,
    pub secondary: Arc<FakeDhcpServer>,
    pub probe: Arc<FakeProbe>,
    pub coordinator: DhcpRoleCoordinator,
    pub tracker: LeaseTracker,
    pub timing: Timing,
}

impl Rig {
    pub fn new(primary: FakeDhcpServer, secondary: FakeDhcpServer, probe: FakeProbe) -> Self {
        let primary = Arc::new(primary);
        let secondary = Arc::new(secondary);
        let probe = Arc::new(probe);
        let pair = ServerPair::new(primary.clone(), secondary.clone());
        let timing = Timing::default();
        let probe_dyn: Arc<dyn Probe> = probe.clone();

        Self {
            coordinator: DhcpRoleCoordinator::new(pair.clone(), Span::none())
                .with_timing(timing.clone()),
            tracker: LeaseTracker::new(pair, probe_dyn, Span::none()).with_timing(timing.clone()),
            primary,
            secondary,
            probe,
            timing,
        }
    }

    pub fn ctx(&self) -> ScenarioContext<'_> {
        ScenarioContext::new(
            DEVICE,
            &self.coordinator,
            &self.tracker,
            self.probe.as_ref(),
            &self.timing,
        )
    }
}
