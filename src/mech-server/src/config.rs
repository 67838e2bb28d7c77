// SPDX-FileCopyrightText: 2026 Stan Grams <sjg@haxx.space>
//
// SPDX-License-Identifier: BSD-2-Clause

//! Configuration file support for mech-server.
//!
//! Config is loaded from the `[mech-server]` section of `mech-rs.toml`.
//! Default search order:
//! 1. Path specified via `--config` CLI argument
//! 2. `./mech-rs.toml`
//! 3. `~/.config/mech-rs/mech-rs.toml`
//! 4. `/etc/mech-rs/mech-rs.toml`

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use mech_app::ConfigFile;

/// Top-level server configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// General settings
    pub general: GeneralConfig,
    /// HTTP status endpoint
    pub listen: ListenConfig,
    /// Seeded provider lists per capability
    pub discovery: DiscoveryConfig,
    /// Automation rule table
    pub rules: RulesConfig,
}

impl ConfigFile for ServerConfig {
    fn section_key() -> &'static str {
        "mech-server"
    }
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error)
    pub log_level: Option<String>,
    /// Host name reported in the status document. Defaults to the
    /// HOSTNAME environment variable.
    pub host: Option<String>,
}

/// HTTP status endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListenConfig {
    /// IP address for the status endpoint
    pub address: IpAddr,
    /// Port for the status endpoint
    pub port: u16,
    /// Size cap for the status document, in bytes
    pub status_cap: usize,
}

impl Default for ListenConfig {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 4560,
            status_cap: 64 * 1024,
        }
    }
}

/// Seeded provider base URLs per capability. These stand in for a
/// live discovery service; each list is served as-is.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Actuator ("control") server base URLs
    pub control: Vec<String>,
    /// History service base URLs
    pub history: Vec<String>,
    /// Almanac service base URLs
    pub almanac: Vec<String>,
}

/// Rule table location.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// TOML rule table path. Without one, automation is disabled.
    pub file: Option<PathBuf>,
}

/// Example configuration printed by `--print-config`.
pub const EXAMPLE_CONFIG: &str = r#"[mech-server]

[mech-server.general]
log_level = "info"

[mech-server.listen]
address = "0.0.0.0"
port = 4560

[mech-server.discovery]
control = ["http://relay1.local/relay", "http://relay2.local/relay"]
history = ["http://saga1.local/saga", "http://saga2.local/saga"]
almanac = ["http://almanac.local/almanac"]

[mech-server.rules]
file = "/etc/mech-rs/rules.toml"
"#;
