use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DialerConfig {
    /// Keep the resolver's IPv6-first order for the proxy server.
    #[serde(default)]
    pub prefer_ipv6: bool,

    #[serde(default = "default_resolve_timeout_secs")]
    pub resolve_timeout_secs: u64,

    #[serde(default = "default_max_resolve_attempts")]
    pub max_resolve_attempts: u32,

    #[serde(default = "default_retry_interval_secs")]
    pub retry_interval_secs: u64,

    /// Minimum spacing between two rotations of the server address.
    #[serde(default = "default_rotation_throttle_secs")]
    pub rotation_throttle_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// `SO_MARK` used to exempt sockets from policy routing.
    #[serde(default)]
    pub fwmark: Option<u32>,
}

impl DialerConfig {
    pub fn resolve_timeout(&self) -> Duration {
        Duration::from_secs(self.resolve_timeout_secs)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(self.retry_interval_secs)
    }

    pub fn rotation_throttle(&self) -> Duration {
        Duration::from_secs(self.rotation_throttle_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for DialerConfig {
    fn default() -> Self {
        Self {
            prefer_ipv6: false,
            resolve_timeout_secs: default_resolve_timeout_secs(),
            max_resolve_attempts: default_max_resolve_attempts(),
            retry_interval_secs: default_retry_interval_secs(),
            rotation_throttle_secs: default_rotation_throttle_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            fwmark: None,
        }
    }
}

fn default_resolve_timeout_secs() -> u64 {
    10
}

fn default_max_resolve_attempts() -> u32 {
    10
}

fn default_retry_interval_secs() -> u64 {
    2
}

fn default_rotation_throttle_secs() -> u64 {
    5
}

fn default_connect_timeout_secs() -> u64 {
    30
}
