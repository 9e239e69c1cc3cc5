//! Scripted stand-ins for a DHCP server and the ping probe

use crate::client::{DhcpServerClient, RangeResponse, Response};
use crate::probe::Probe;
use async_trait::async_trait;
use dhcpconn_core::{local_now, Error, Lease, MacAddr, Result, EXPIRES_FORMAT};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::net::{IpAddr, Ipv4Addr};

/// Control calls a [`FakeDhcpServer`] records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Call {
    GetDhcpRange,
    SetDhcpRange,
    GetLease,
    AddReservedLease,
    DeleteReservedLease,
    EnableFailover,
    DisableFailover,
    StartDhcpServer,
    StopDhcpServer,
    GetStatus,
}

/// A reserved lease held by the fake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub hostname: String,
    pub mac: MacAddr,
    pub ip: Ipv4Addr,
}

/// Lease expiring `expires_in_secs` from now (negative for an expired one)
pub fn lease(mac: MacAddr, ip: Ipv4Addr, expires_in_secs: i64) -> Lease {
    Lease {
        mac_address: mac,
        ip_address: ip,
        hostname: "dut".to_string(),
        expires_at: local_now() + chrono::Duration::seconds(expires_in_secs),
    }
}

/// JSON lease payload as a server would send it
pub fn lease_message(lease: &Lease) -> String {
    format!(
        r#"{{"ip": "{}", "hostname": "{}", "hw_addr": "{}", "expires": "{}"}}"#,
        lease.ip_address,
        lease.hostname,
        lease.mac_address,
        lease.expires_at.format(EXPIRES_FORMAT)
    )
}

#[derive(Debug)]
struct FakeState {
    running: bool,
    failover: bool,
    range: (String, String),
    ignore_range_changes: bool,
    stays_running: bool,
    status_message: Option<String>,
    unreachable: bool,
    lease: Option<Lease>,
    lease_script: VecDeque<Option<Lease>>,
    reservations: Vec<Reservation>,
    failing: HashSet<Call>,
    calls: Vec<Call>,
}

/// In-memory DHCP server answering control calls from scripted state
#[derive(Debug)]
pub struct FakeDhcpServer {
    name: String,
    state: Mutex<FakeState>,
}

impl FakeDhcpServer {
    /// Running server in failover with range 10.10.10.2-10.10.10.254 and no lease
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Mutex::new(FakeState {
                running: true,
                failover: true,
                range: ("10.10.10.2".to_string(), "10.10.10.254".to_string()),
                ignore_range_changes: false,
                stays_running: false,
                status_message: None,
                unreachable: false,
                lease: None,
                lease_script: VecDeque::new(),
                reservations: Vec::new(),
                failing: HashSet::new(),
                calls: Vec::new(),
            }),
        }
    }

    pub fn with_range(self, start: &str, end: &str) -> Self {
        self.state.lock().range = (start.to_string(), end.to_string());
        self
    }

    /// Lease reported whenever the script is exhausted
    pub fn with_lease(self, lease: Lease) -> Self {
        self.set_lease(Some(lease));
        self
    }

    /// Answer `call` with code 500
    pub fn failing(self, call: Call) -> Self {
        self.state.lock().failing.insert(call);
        self
    }

    /// Every call fails at the transport level
    pub fn unreachable(self) -> Self {
        self.state.lock().unreachable = true;
        self
    }

    /// Accept range changes without applying them
    pub fn ignoring_range_changes(self) -> Self {
        self.state.lock().ignore_range_changes = true;
        self
    }

    /// Accept stop commands but keep reporting `running`
    pub fn staying_running(self) -> Self {
        self.state.lock().stays_running = true;
        self
    }

    /// Answer status queries with `message` whatever the run state
    pub fn reporting_status(self, message: &str) -> Self {
        self.state.lock().status_message = Some(message.to_string());
        self
    }

    pub fn set_lease(&self, lease: Option<Lease>) {
        self.state.lock().lease = lease;
    }

    /// Queue a one-shot lease answer, consumed before the standing lease
    pub fn push_lease(&self, lease: Option<Lease>) {
        self.state.lock().lease_script.push_back(lease);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn call_count(&self, call: Call) -> usize {
        self.state.lock().calls.iter().filter(|c| **c == call).count()
    }

    pub fn is_running(&self) -> bool {
        self.state.lock().running
    }

    pub fn failover_enabled(&self) -> bool {
        self.state.lock().failover
    }

    pub fn range(&self) -> (String, String) {
        self.state.lock().range.clone()
    }

    pub fn reservations(&self) -> Vec<Reservation> {
        self.state.lock().reservations.clone()
    }

    /// Record `call` and decide whether it goes through
    fn enter(&self, call: Call) -> Result<Option<Response>> {
        let mut state = self.state.lock();
        state.calls.push(call);
        if state.unreachable {
            return Err(Error::client(self.name.clone(), "connection refused"));
        }
        if state.failing.contains(&call) {
            return Ok(Some(Response::new(500, "internal error")));
        }
        Ok(None)
    }

    fn apply<F>(&self, call: Call, f: F) -> Result<Response>
    where
        F: FnOnce(&mut FakeState) -> Response,
    {
        if let Some(rejected) = self.enter(call)? {
            return Ok(rejected);
        }
        let mut state = self.state.lock();
        Ok(f(&mut *state))
    }
}

#[async_trait]
impl DhcpServerClient for FakeDhcpServer {
    async fn get_dhcp_range(&self) -> Result<RangeResponse> {
        if let Some(rejected) = self.enter(Call::GetDhcpRange)? {
            return Ok(RangeResponse::new(rejected.code, "", ""));
        }
        let (start, end) = self.state.lock().range.clone();
        Ok(RangeResponse::new(200, start, end))
    }

    async fn set_dhcp_range(&self, start: Ipv4Addr, end: Ipv4Addr) -> Result<Response> {
        self.apply(Call::SetDhcpRange, |state| {
            if !state.ignore_range_changes {
                state.range = (start.to_string(), end.to_string());
            }
            Response::ok()
        })
    }

    async fn get_lease(&self, _mac: &MacAddr) -> Result<Response> {
        self.apply(Call::GetLease, |state| {
            let lease = match state.lease_script.pop_front() {
                Some(scripted) => scripted,
                None => state.lease.clone(),
            };
            match lease {
                Some(lease) => Response::new(200, lease_message(&lease)),
                None => Response::new(200, "{}"),
            }
        })
    }

    async fn add_reserved_lease(
        &self,
        hostname: &str,
        mac: &MacAddr,
        ip: Ipv4Addr,
    ) -> Result<Response> {
        self.apply(Call::AddReservedLease, |state| {
            state.reservations.push(Reservation {
                hostname: hostname.to_string(),
                mac: *mac,
                ip,
            });
            Response::ok()
        })
    }

    async fn delete_reserved_lease(&self, mac: &MacAddr) -> Result<Response> {
        self.apply(Call::DeleteReservedLease, |state| {
            state.reservations.retain(|r| r.mac != *mac);
            Response::ok()
        })
    }

    async fn enable_failover(&self) -> Result<Response> {
        self.apply(Call::EnableFailover, |state| {
            state.failover = true;
            Response::ok()
        })
    }

    async fn disable_failover(&self) -> Result<Response> {
        self.apply(Call::DisableFailover, |state| {
            state.failover = false;
            Response::ok()
        })
    }

    async fn start_dhcp_server(&self) -> Result<Response> {
        self.apply(Call::StartDhcpServer, |state| {
            state.running = true;
            Response::ok()
        })
    }

    async fn stop_dhcp_server(&self) -> Result<Response> {
        self.apply(Call::StopDhcpServer, |state| {
            if !state.stays_running {
                state.running = false;
            }
            Response::ok()
        })
    }

    async fn get_status(&self) -> Result<Response> {
        self.apply(Call::GetStatus, |state| {
            match &state.status_message {
                Some(message) => Response::new(200, message.clone()),
                None => Response::new(200, if state.running { "running" } else { "stopped" }),
            }
        })
    }
}

#[derive(Debug, Default)]
struct ProbeState {
    reachable: HashSet<IpAddr>,
    failures_left: HashMap<IpAddr, u32>,
    pings: Vec<IpAddr>,
}

/// Probe answering from a set of reachable hosts
#[derive(Debug, Default)]
pub struct FakeProbe {
    state: Mutex<ProbeState>,
}

impl FakeProbe {
    /// Nothing is reachable
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reachable(self, host: impl Into<IpAddr>) -> Self {
        self.set_reachable(host, true);
        self
    }

    /// Reachable once `failures` pings of it have gone unanswered
    pub fn reachable_after(self, host: impl Into<IpAddr>, failures: u32) -> Self {
        let host = host.into();
        {
            let mut state = self.state.lock();
            state.reachable.insert(host);
            state.failures_left.insert(host, failures);
        }
        self
    }

    pub fn set_reachable(&self, host: impl Into<IpAddr>, reachable: bool) {
        let host = host.into();
        let mut state = self.state.lock();
        if reachable {
            state.reachable.insert(host);
        } else {
            state.reachable.remove(&host);
        }
    }

    /// Every host pinged so far, in order
    pub fn pings(&self) -> Vec<IpAddr> {
        self.state.lock().pings.clone()
    }

    pub fn ping_count(&self, host: impl Into<IpAddr>) -> usize {
        let host = host.into();
        self.state.lock().pings.iter().filter(|h| **h == host).count()
    }
}

#[async_trait]
impl Probe for FakeProbe {
    async fn ping(&self, host: IpAddr) -> bool {
        let mut state = self.state.lock();
        state.pings.push(host);
        if let Some(left) = state.failures_left.get_mut(&host) {
            if *left > 0 {
                *left -= 1;
                return false;
            }
        }
        state.reachable.contains(&host)
    }
}
