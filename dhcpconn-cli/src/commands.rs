//! Subcommand execution

use crate::args::{Cli, Commands};
use dhcpconn_capture::{CaptureSet, PacketClassifier};
use dhcpconn_core::{Error, MacAddr, ModuleConfig, Result, SubnetRange, TestOutcome};
use dhcpconn_module::ConnectionCheck;
use std::io::Write;
use tracing::{debug, info_span};

/// Run the selected subcommand, writing its report to `out`.
///
/// Returns the verdict: `Some(true)` pass, `Some(false)` fail, `None`
/// inconclusive or informational.
pub fn execute(cli: &Cli, out: &mut dyn Write) -> Result<Option<bool>> {
    match &cli.command {
        Commands::SingleIp => {
            let config = cli.load_config()?;
            let outcome = single_ip(&config)?;
            report(out, outcome)
        }
        Commands::Ipv6Slaac { prefix } => {
            let mut config = cli.load_config()?;
            if let Some(prefix) = prefix {
                config.slaac_prefix = prefix.clone();
            }
            let outcome = ipv6_slaac(&config)?;
            report(out, outcome)
        }
        Commands::Contains { start, end, ip } => {
            let range = SubnetRange::new(*start, *end)?;
            let inside = range.contains(*ip);
            writeln!(out, "{} {} {}", ip, if inside { "is in" } else { "is not in" }, range)?;
            Ok(Some(inside))
        }
        Commands::Checks => {
            for check in ConnectionCheck::ALL {
                writeln!(out, "{}", check)?;
            }
            Ok(None)
        }
    }
}

fn report(out: &mut dyn Write, outcome: TestOutcome) -> Result<Option<bool>> {
    writeln!(out, "{}", outcome)?;
    Ok(outcome.into_result().0)
}

fn device_mac(config: &ModuleConfig) -> Result<MacAddr> {
    config
        .device
        .mac
        .ok_or_else(|| Error::config("device MAC address is required (--device-mac)"))
}

fn classifier(config: &ModuleConfig) -> PacketClassifier {
    PacketClassifier::new(info_span!("classifier"))
        .with_harness_mac_prefix(config.harness_mac_prefix.clone())
}

fn single_ip(config: &ModuleConfig) -> Result<TestOutcome> {
    let mac = device_mac(config)?;
    let frames = CaptureSet::open_dhcp(&config.captures)?;
    debug!(frames = frames.len(), "Captures loaded");
    Ok(classifier(config).detect_single_address_usage(&frames, mac))
}

fn ipv6_slaac(config: &ModuleConfig) -> Result<TestOutcome> {
    let mac = device_mac(config)?;
    let frames = CaptureSet::open_device_ipv6(&config.captures, &mac)?;
    debug!(frames = frames.len(), "Monitor capture loaded");
    let detection = classifier(config).detect_ipv6_slaac(&frames, mac, &config.slaac_prefix);
    Ok(detection.outcome)
}
