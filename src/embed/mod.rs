//! Embedded static assets.
//!
//! The live-reload client is minified by `build.rs` and rendered with the
//! WebSocket port and notification flag at serve time.

/// URL under which the dev server exposes the reload client.
pub const HOTRELOAD_URL: &str = "/__pagesmith/hotreload.js";

const HOTRELOAD_JS: &str = include_str!(concat!(env!("OUT_DIR"), "/hotreload.min.js"));

/// Variables for hotreload.js.
pub struct HotreloadVars {
    pub ws_port: u16,
    pub notify: bool,
}

impl HotreloadVars {
    /// Render the reload client with these variables.
    pub fn render(&self) -> String {
        HOTRELOAD_JS
            .replace("__PAGESMITH_WS_PORT__", &self.ws_port.to_string())
            .replace(
                "__PAGESMITH_NOTIFY__",
                if self.notify { "true" } else { "false" },
            )
    }
}

/// `<script>` tag loading the reload client.
pub fn hotreload_tag() -> String {
    format!(r#"<script src="{HOTRELOAD_URL}" defer></script>"#)
}
