//! The connection module: one device, every connection check

use crate::checks::ConnectionCheck;
use crate::context::ScenarioContext;
use crate::scenario;
use crate::subnet::SubnetTestRunner;
use dhcpconn_capture::{CaptureSet, PacketClassifier};
use dhcpconn_core::{Lease, MacAddr, ModuleConfig, TestOutcome};
use dhcpconn_server::{DhcpRoleCoordinator, LeaseTracker, Probe, ServerPair};
use parking_lot::Mutex;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument, Span};
use uuid::Uuid;

const NO_MAC: &str = "No MAC address found.";

/// Connection checks for a single device under test.
///
/// Owns the components every check runs against. Each network scenario is
/// run inside its own span carrying the check name and a fresh run id.
pub struct ConnectionModule {
    config: ModuleConfig,
    device_mac: Option<MacAddr>,
    /// Configured, or resolved from the device's lease on first use
    device_ipv4: Mutex<Option<Ipv4Addr>>,
    /// SLAAC address found by the last `ipv6_slaac` run
    device_ipv6: Mutex<Option<Ipv6Addr>>,
    coordinator: DhcpRoleCoordinator,
    tracker: LeaseTracker,
    probe: Arc<dyn Probe>,
    classifier: PacketClassifier,
    span: Span,
}

impl ConnectionModule {
    pub fn new(config: ModuleConfig, servers: ServerPair, probe: Arc<dyn Probe>) -> Self {
        let span = info_span!("connection", device = ?config.device.mac);
        let timing = config.timing.clone();

        let coordinator =
            DhcpRoleCoordinator::new(servers.clone(), info_span!(parent: &span, "coordinator"))
                .with_timing(timing.clone());
        let tracker = LeaseTracker::new(
            servers,
            probe.clone(),
            info_span!(parent: &span, "lease_tracker"),
        )
        .with_timing(timing);
        let classifier = PacketClassifier::new(info_span!(parent: &span, "classifier"))
            .with_harness_mac_prefix(config.harness_mac_prefix.clone());

        Self {
            device_mac: config.device.mac,
            device_ipv4: Mutex::new(config.device.ipv4),
            device_ipv6: Mutex::new(None),
            config,
            coordinator,
            tracker,
            probe,
            classifier,
            span,
        }
    }

    pub fn config(&self) -> &ModuleConfig {
        &self.config
    }

    pub fn device_mac(&self) -> Option<MacAddr> {
        self.device_mac
    }

    pub fn device_ipv6(&self) -> Option<Ipv6Addr> {
        *self.device_ipv6.lock()
    }

    pub fn coordinator(&self) -> &DhcpRoleCoordinator {
        &self.coordinator
    }

    /// Run one check by name
    pub async fn run(&self, check: ConnectionCheck) -> TestOutcome {
        let outcome = match check {
            ConnectionCheck::PrivateAddress => self.private_address().await,
            ConnectionCheck::SharedAddress => self.shared_address().await,
            ConnectionCheck::DhcpAddress => self.dhcp_address().await,
            ConnectionCheck::MacAddress => self.mac_address(),
            ConnectionCheck::SingleIp => self.single_ip(),
            ConnectionCheck::TargetPing => self.target_ping().await,
            ConnectionCheck::IpChange => self.ip_change().await,
            ConnectionCheck::DhcpFailover => self.dhcp_failover().await,
            ConnectionCheck::Ipv6Slaac => self.ipv6_slaac(),
            ConnectionCheck::Ipv6Ping => self.ipv6_ping().await,
        };
        let _enter = self.span.enter();
        info!(%check, verdict = %outcome.verdict, detail = %outcome.detail, "Check finished");
        outcome
    }

    pub fn mac_address(&self) -> TestOutcome {
        let _enter = self.span.enter();
        info!("Running connection.mac_address");
        match self.device_mac {
            Some(mac) => {
                info!("MAC address found: {}", mac);
                TestOutcome::pass(format!("MAC address found: {}", mac))
            }
            None => {
                info!("No MAC address found");
                TestOutcome::fail(NO_MAC)
            }
        }
    }

    /// Ping the address PRIMARY leased to the device
    pub async fn dhcp_address(&self) -> TestOutcome {
        let Some(mac) = self.device_mac else {
            return TestOutcome::fail(NO_MAC);
        };
        async {
            info!("Running connection.dhcp_address");
            match self.tracker.current_lease(&mac).await {
                Ok(Some(lease)) => {
                    info!("IP Resolved: {}", lease.ip_address);
                    if self.tracker.is_lease_active(&lease).await {
                        TestOutcome::pass("Device responded to leased ip address")
                    } else {
                        TestOutcome::fail("Device did not respond to leased ip address")
                    }
                }
                Ok(None) => {
                    info!("No DHCP lease found for: {}", mac);
                    TestOutcome::fail(format!("No DHCP lease found for: {}", mac))
                }
                Err(e) => {
                    warn!(error = %e, "Lease query failed");
                    TestOutcome::inconclusive(format!("Could not query DHCP lease: {}", e))
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }

    pub async fn target_ping(&self) -> TestOutcome {
        async {
            info!("Running connection.target_ping");
            let Some(ip) = self.resolve_ipv4().await else {
                error!("No device IP could be resolved");
                return TestOutcome::fail("Could not resolve device IP");
            };
            if self.probe.ping(IpAddr::V4(ip)).await {
                TestOutcome::pass("Device responds to ping")
            } else {
                TestOutcome::fail("Device does not respond to ping")
            }
        }
        .instrument(self.span.clone())
        .await
    }

    async fn resolve_ipv4(&self) -> Option<Ipv4Addr> {
        if let Some(ip) = *self.device_ipv4.lock() {
            return Some(ip);
        }
        let mac = self.device_mac?;
        let lease: Option<Lease> = match self.tracker.current_lease(&mac).await {
            Ok(lease) => lease,
            Err(e) => {
                warn!(error = %e, "Lease query failed");
                None
            }
        };
        let ip = lease.map(|lease| lease.ip_address)?;
        info!(%ip, "Device IPv4 resolved from lease");
        *self.device_ipv4.lock() = Some(ip);
        Some(ip)
    }

    /// Startup and monitor captures show DHCPREQUESTs from the device only
    pub fn single_ip(&self) -> TestOutcome {
        let _enter = self.span.enter();
        info!("Running connection.single_ip");
        let Some(mac) = self.device_mac else {
            info!("No MAC address found");
            return TestOutcome::inconclusive(NO_MAC);
        };
        match CaptureSet::open_dhcp(&self.config.captures) {
            Ok(frames) => self.classifier.detect_single_address_usage(&frames, mac),
            Err(e) => {
                error!(error = %e, "Failed to read captures");
                TestOutcome::inconclusive(e.to_string())
            }
        }
    }

    /// Look for a SLAAC address in the monitor capture and remember it
    pub fn ipv6_slaac(&self) -> TestOutcome {
        let _enter = self.span.enter();
        info!("Running connection.ipv6_slaac");
        let Some(mac) = self.device_mac else {
            return TestOutcome::inconclusive(NO_MAC);
        };
        let frames = match CaptureSet::open_device_ipv6(&self.config.captures, &mac) {
            Ok(frames) => frames,
            Err(e) => {
                error!(error = %e, "Failed to read monitor capture");
                return TestOutcome::inconclusive(e.to_string());
            }
        };

        let detection = self
            .classifier
            .detect_ipv6_slaac(&frames, mac, &self.config.slaac_prefix);
        if let Some(addr) = detection.address {
            *self.device_ipv6.lock() = Some(addr);
        }
        detection.outcome
    }

    pub async fn ipv6_ping(&self) -> TestOutcome {
        async {
            info!("Running connection.ipv6_ping");
            let Some(addr) = self.device_ipv6() else {
                info!("No IPv6 SLAAC address found. Cannot ping");
                return TestOutcome::fail("No IPv6 SLAAC address found. Cannot ping");
            };
            if self.probe.ping(IpAddr::V6(addr)).await {
                info!("Device responds to IPv6 ping on {}", addr);
                TestOutcome::pass(format!("Device responds to IPv6 ping on {}", addr))
            } else {
                info!("Device does not respond to IPv6 ping");
                TestOutcome::fail("Device does not respond to IPv6 ping")
            }
        }
        .instrument(self.span.clone())
        .await
    }

    pub async fn private_address(&self) -> TestOutcome {
        self.subnet_sweep(ConnectionCheck::PrivateAddress).await
    }

    pub async fn shared_address(&self) -> TestOutcome {
        self.subnet_sweep(ConnectionCheck::SharedAddress).await
    }

    async fn subnet_sweep(&self, check: ConnectionCheck) -> TestOutcome {
        let Some(mac) = self.device_mac else {
            return TestOutcome::inconclusive(NO_MAC);
        };
        let span = self.scenario_span(check);
        let runner = SubnetTestRunner::new(self.context(mac), span);
        runner.run(self.config.ranges.as_deref()).await
    }

    pub async fn ip_change(&self) -> TestOutcome {
        let Some(mac) = self.device_mac else {
            return TestOutcome::inconclusive(NO_MAC);
        };
        let span = self.scenario_span(ConnectionCheck::IpChange);
        let Some(target) = self.config.ip_change_target else {
            let _enter = span.enter();
            warn!("No IP change target configured");
            return TestOutcome::inconclusive("No IP change target configured");
        };
        scenario::ip_change(self.context(mac), target)
            .instrument(span)
            .await
    }

    pub async fn dhcp_failover(&self) -> TestOutcome {
        let Some(mac) = self.device_mac else {
            return TestOutcome::inconclusive(NO_MAC);
        };
        let span = self.scenario_span(ConnectionCheck::DhcpFailover);
        scenario::dhcp_failover(self.context(mac))
            .instrument(span)
            .await
    }

    fn context(&self, mac: MacAddr) -> ScenarioContext<'_> {
        ScenarioContext::new(
            mac,
            &self.coordinator,
            &self.tracker,
            self.probe.as_ref(),
            &self.config.timing,
        )
    }

    fn scenario_span(&self, check: ConnectionCheck) -> Span {
        info_span!(parent: &self.span, "scenario", %check, run_id = %Uuid::now_v7())
    }
}
