//! Configuration types for service discovery

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the SLP discovery engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Path or name of the OpenSLP `slptool` executable
    #[serde(default = "default_slptool_path")]
    pub slptool_path: PathBuf,

    /// Scope list used when a query does not name one (empty = configured scopes)
    #[serde(default)]
    pub default_scope: String,

    /// Naming authority for service type enumeration ("*" = all, "" = IANA)
    #[serde(default = "default_naming_authority")]
    pub naming_authority: String,

    /// Resolve a hostname for every discovered service IP
    #[serde(default = "default_resolve_hostnames")]
    pub resolve_hostnames: bool,

    /// How many services may have attributes and hostnames fetched at once
    #[serde(default = "default_lookup_concurrency")]
    pub lookup_concurrency: usize,

    /// Upper bound for a single agent invocation (seconds)
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            slptool_path: default_slptool_path(),
            default_scope: String::new(),
            naming_authority: default_naming_authority(),
            resolve_hostnames: default_resolve_hostnames(),
            lookup_concurrency: default_lookup_concurrency(),
            command_timeout_secs: default_command_timeout(),
        }
    }
}

impl DiscoveryConfig {
    /// Returns the command timeout as a Duration
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.slptool_path.as_os_str().is_empty() {
            return Err("slptool_path cannot be empty".to_string());
        }

        if self.lookup_concurrency == 0 {
            return Err("lookup_concurrency cannot be 0".to_string());
        }

        if self.command_timeout_secs == 0 {
            return Err("command_timeout_secs cannot be 0".to_string());
        }

        Ok(())
    }
}

// Default configuration values
fn default_slptool_path() -> PathBuf {
    PathBuf::from("slptool")
}

fn default_naming_authority() -> String {
    "*".to_string()
}

fn default_resolve_hostnames() -> bool {
    true
}

fn default_lookup_concurrency() -> usize {
    8
}

fn default_command_timeout() -> u64 {
    10
}
