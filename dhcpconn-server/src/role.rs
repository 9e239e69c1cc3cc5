//! Server roles and the client pair they map to

use crate::client::DhcpServerClient;
use std::fmt;
use std::sync::Arc;

/// Position of a server in the failover pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServerRole {
    /// Authoritative for assignment while the pair is collapsed
    Primary,
    Secondary,
}

impl ServerRole {
    pub const ALL: [ServerRole; 2] = [ServerRole::Primary, ServerRole::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            ServerRole::Primary => "PRIMARY",
            ServerRole::Secondary => "SECONDARY",
        }
    }

    /// The other member of the pair
    pub fn peer(&self) -> ServerRole {
        match self {
            ServerRole::Primary => ServerRole::Secondary,
            ServerRole::Secondary => ServerRole::Primary,
        }
    }
}

impl fmt::Display for ServerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One client per role
#[derive(Clone)]
pub struct ServerPair {
    primary: Arc<dyn DhcpServerClient>,
    secondary: Arc<dyn DhcpServerClient>,
}

impl ServerPair {
    pub fn new(primary: Arc<dyn DhcpServerClient>, secondary: Arc<dyn DhcpServerClient>) -> Self {
        Self { primary, secondary }
    }

    pub fn client(&self, role: ServerRole) -> &dyn DhcpServerClient {
        match role {
            ServerRole::Primary => self.primary.as_ref(),
            ServerRole::Secondary => self.secondary.as_ref(),
        }
    }

    /// Client that assigns addresses while the pair is collapsed
    pub fn authoritative(&self) -> &dyn DhcpServerClient {
        self.client(ServerRole::Primary)
    }
}

impl fmt::Debug for ServerPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerPair").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(ServerRole::Primary.to_string(), "PRIMARY");
        assert_eq!(ServerRole::Secondary.to_string(), "SECONDARY");
    }

    #[test]
    fn test_role_peer() {
        for role in ServerRole::ALL {
            assert_ne!(role.peer(), role);
            assert_eq!(role.peer().peer(), role);
        }
    }
}
