//! Hot Reload Message Protocol
//!
//! JSON messages sent over WebSocket from the development server to
//! browser clients.
//!
//! # Message Types
//!
//! - `connected`: Sent once after the handshake
//! - `reload`: Files changed. The client refreshes stylesheets in place when
//!   every path is a `.css` file, and reloads the page otherwise

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Hot reload message sent over WebSocket
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HotReloadMessage {
    /// Files changed on disk (paths relative to a serving root, `/`-separated)
    Reload { paths: Vec<String> },

    /// Connection established
    Connected {
        /// Server version for compatibility check
        version: String,
    },
}

impl HotReloadMessage {
    /// Create a reload message for the given changed files
    pub fn reload(paths: &[PathBuf]) -> Self {
        Self::Reload {
            paths: paths
                .iter()
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .collect(),
        }
    }

    /// Create a connected message
    pub fn connected() -> Self {
        Self::Connected {
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Serialize to JSON string
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"type":"reload","paths":[]}"#.to_string())
    }

    /// Parse from JSON string
    #[cfg(test)]
    pub fn from_json(s: &str) -> Option<Self> {
        serde_json::from_str(s).ok()
    }
}
