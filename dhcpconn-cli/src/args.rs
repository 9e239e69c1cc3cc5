//! CLI argument parsing

use clap::{Parser, Subcommand};
use dhcpconn_core::{MacAddr, ModuleConfig, Result};
use std::net::Ipv4Addr;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "dhcpconn")]
#[command(version, about = "DHCP connectivity checks for a device under test", long_about = None)]
pub struct Cli {
    /// Module configuration file (JSON)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// MAC address of the device under test
    #[arg(short = 'm', long, global = true, value_name = "MAC")]
    pub device_mac: Option<MacAddr>,

    /// Capture written during device startup
    #[arg(long, global = true, value_name = "PCAP")]
    pub startup: Option<PathBuf>,

    /// Capture written during the monitoring period
    #[arg(long, global = true, value_name = "PCAP")]
    pub monitor: Option<PathBuf>,

    /// Verbose output (-v, -vv, -vvv for increasing verbosity)
    #[arg(short = 'v', long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check that only the device sent DHCPREQUESTs in both captures
    SingleIp,

    /// Look for a SLAAC address formed by the device in the monitor capture
    Ipv6Slaac {
        /// Address prefix the router advertises
        #[arg(short, long, value_name = "PREFIX")]
        prefix: Option<String>,
    },

    /// Test whether an address lies inside a subnet range
    Contains {
        /// First address of the range
        start: Ipv4Addr,
        /// Last address of the range
        end: Ipv4Addr,
        /// Address to test
        ip: Ipv4Addr,
    },

    /// List the connection check names
    Checks,
}

impl Cli {
    /// Parse command-line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Configuration file (or defaults) with command-line overrides applied
    pub fn load_config(&self) -> Result<ModuleConfig> {
        let mut config = match &self.config {
            Some(path) => ModuleConfig::from_file(path)?,
            None => ModuleConfig::default(),
        };
        if let Some(mac) = self.device_mac {
            config.device.mac = Some(mac);
        }
        if let Some(path) = &self.startup {
            config.captures.startup = path.clone();
        }
        if let Some(path) = &self.monitor {
            config.captures.monitor = path.clone();
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_parse_single_ip() {
        let cli = Cli::parse_from([
            "dhcpconn",
            "single-ip",
            "--device-mac",
            "02:42:ac:11:00:02",
            "--startup",
            "/tmp/startup.pcap",
            "-vv",
        ]);
        assert!(matches!(cli.command, Commands::SingleIp));
        assert_eq!(cli.verbose, 2);

        let config = cli.load_config().unwrap();
        assert_eq!(config.device.mac, Some("02:42:AC:11:00:02".parse().unwrap()));
        assert_eq!(config.captures.startup, PathBuf::from("/tmp/startup.pcap"));
        assert_eq!(
            config.captures.monitor,
            PathBuf::from("/runtime/device/monitor.pcap")
        );
    }

    #[test]
    fn test_bad_mac_rejected() {
        assert!(Cli::try_parse_from(["dhcpconn", "-m", "02:42", "single-ip"]).is_err());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"device": {{"mac": "02:42:ac:11:00:02"}}, "captures": {{"monitor": "/data/m.pcap"}}}}"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let cli = Cli::parse_from([
            "dhcpconn",
            "--config",
            path.as_str(),
            "--monitor",
            "/other/m.pcap",
            "ipv6-slaac",
        ]);
        let config = cli.load_config().unwrap();

        assert_eq!(config.device.mac, Some("02:42:ac:11:00:02".parse().unwrap()));
        assert_eq!(config.captures.monitor, PathBuf::from("/other/m.pcap"));
    }

    #[test]
    fn test_parse_contains() {
        let cli = Cli::parse_from(["dhcpconn", "contains", "10.0.0.10", "10.0.0.20", "10.0.0.15"]);
        match cli.command {
            Commands::Contains { start, end, ip } => {
                assert_eq!(start, Ipv4Addr::new(10, 0, 0, 10));
                assert_eq!(end, Ipv4Addr::new(10, 0, 0, 20));
                assert_eq!(ip, Ipv4Addr::new(10, 0, 0, 15));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
