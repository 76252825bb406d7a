//! `[serve]` section configuration.
//!
//! Contains gallery server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! enable = true               # serve the gallery while watching
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 5277                 # HTTP port number
//! open_browser = false        # open the gallery once the server is up
//! poll_interval_ms = 1000     # how often gallery clients poll
//! ```
//!
//! The gallery has no authentication; keep it on localhost.

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigDiagnostics, FieldPath};

/// Gallery server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    pub enable: bool,

    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    pub open_browser: bool,

    pub poll_interval_ms: u64,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            enable: true,
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 5277,
            open_browser: false,
            poll_interval_ms: 1000,
        }
    }
}

impl ServeConfig {
    pub fn url(&self) -> String {
        let host = match self.interface {
            IpAddr::V4(v4) if v4.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            other => other,
        };
        match host {
            IpAddr::V6(v6) => format!("http://[{v6}]:{}", self.port),
            IpAddr::V4(v4) => format!("http://{v4}:{}", self.port),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.poll_interval_ms < 100 {
            diag.error(
                FieldPath::new("serve.poll_interval_ms"),
                format!("must be at least 100, got {}", self.poll_interval_ms),
            );
        }
        if !self.interface.is_loopback() {
            diag.warn(
                FieldPath::new("serve.interface"),
                "the gallery has no authentication and is reachable from the network",
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

    use super::*;
    use crate::config::test_parse_config;

    #[test]
    fn test_serve_config() {
        let config =
            test_parse_config("[serve]\ninterface = \"0.0.0.0\"\nport = 8080\nenable = false");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0))
        );
        assert_eq!(config.serve.port, 8080);
        assert!(!config.serve.enable);
        assert_eq!(config.serve.url(), "http://127.0.0.1:8080");
    }

    #[test]
    fn test_serve_config_defaults() {
        let config = test_parse_config("");

        assert_eq!(
            config.serve.interface,
            IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
        );
        assert_eq!(config.serve.port, 5277);
        assert!(config.serve.enable);
        assert!(!config.serve.open_browser);
        assert_eq!(config.serve.poll_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_serve_config_ipv6() {
        let config = test_parse_config("[serve]\ninterface = \"::1\"\nport = 9000");
        assert_eq!(
            config.serve.interface,
            IpAddr::V6(Ipv6Addr::new(0, 0, 0, 0, 0, 0, 0, 1))
        );
        assert_eq!(config.serve.url(), "http://[::1]:9000");
    }

    #[test]
    fn test_validate() {
        let mut diag = ConfigDiagnostics::new();
        ServeConfig {
            interface: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            poll_interval_ms: 10,
            ..ServeConfig::default()
        }
        .validate(&mut diag);
        assert_eq!(diag.len(), 1);
        assert_eq!(diag.warnings().len(), 1);
    }
}
