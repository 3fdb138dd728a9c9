//! `[serve]` section configuration.
//!
//! Contains development server settings.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 2080                 # HTTP port number
//! ws_port = 35729             # Live reload WebSocket port
//! notify = false              # Show a toast in the browser on reload
//!
//! [serve.routes]
//! "/node_modules" = "node_modules"
//! ```
//!
//! Use `interface = "0.0.0.0"` to make the server accessible from LAN.

use std::collections::BTreeMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Development server settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// HTTP port number.
    pub port: u16,

    /// WebSocket port for reload notifications.
    pub ws_port: u16,

    /// Show a notification popup in the browser on reload.
    pub notify: bool,

    /// URL prefix → directory (relative to the project root) served as-is.
    pub routes: BTreeMap<String, PathBuf>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 2080,
            ws_port: 35729,
            notify: false,
            routes: BTreeMap::from([("/node_modules".into(), "node_modules".into())]),
        }
    }
}
