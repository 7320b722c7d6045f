//! Node connection settings
//!
//! Plain data, deserialized by the binary from its config sources and passed
//! to [`crate::NodeClient`] at construction.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Full base URL; wins over host/port when set
    #[serde(default)]
    pub base_url: Option<String>,

    #[serde(default = "default_host")]
    pub host: String,

    /// Fallback port when no role-specific port is configured
    #[serde(default = "default_port")]
    pub port: u16,

    /// Per-role ports, e.g. `host = 20007`, `crew = 20002`
    #[serde(default)]
    pub ports: HashMap<String, u16>,

    /// Bound on every remote call, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            host: default_host(),
            port: default_port(),
            ports: HashMap::new(),
            timeout_secs: default_timeout(),
        }
    }
}

impl NodeConfig {
    /// Resolve the node base URL.
    ///
    /// Order: explicit `base_url` → `env_override` (the `BASE_URL` variable)
    /// → `ports[role]` → `port`.
    pub fn resolve_base_url(&self, role: Option<&str>, env_override: Option<&str>) -> String {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.is_empty()) {
            return url.trim_end_matches('/').to_string();
        }
        if let Some(url) = env_override.filter(|u| !u.is_empty()) {
            return url.trim_end_matches('/').to_string();
        }

        let port = role
            .and_then(|r| self.ports.get(&r.to_lowercase()))
            .copied()
            .unwrap_or(self.port);
        format!("http://{}:{}", self.host, port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    20000
}

fn default_timeout() -> u64 {
    30
}
