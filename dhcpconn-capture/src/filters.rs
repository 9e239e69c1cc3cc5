//! BPF filter builders for the traffic the checks inspect

use dhcpconn_core::MacAddr;

/// DHCP filter (both client and server)
/// Captures DHCP traffic on ports 67 and 68
pub fn dhcp_filter() -> String {
    "(udp port 67 or udp port 68)".to_string()
}

/// IPv6 filter
pub fn ipv6_filter() -> String {
    "ip6".to_string()
}

/// Filter for specific source MAC address
pub fn src_mac_filter(mac: &MacAddr) -> String {
    format!("ether src {}", mac.to_string().to_ascii_lowercase())
}

/// Combine multiple filters with AND logic
pub fn combine_filters(filters: &[&str]) -> String {
    if filters.is_empty() {
        return String::new();
    }

    filters
        .iter()
        .map(|f| format!("({})", f))
        .collect::<Vec<_>>()
        .join(" and ")
}

/// IPv6 traffic sent by one device
pub fn device_ipv6_filter(mac: &MacAddr) -> String {
    combine_filters(&[&ipv6_filter(), &src_mac_filter(mac)])
}
