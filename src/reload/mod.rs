//! Live reload service.
//!
//! The build pipeline only sees the [`LiveReload`] capability:
//!
//! ```text
//! AssetTask ──ReloadStream──▶ LiveReload::reload(paths) ──▶ WsHub ──▶ Browser
//! DevServer ──────────────▶ LiveReload::init(options)   ──▶ HTTP + WebSocket
//! ```
//!
//! # Modules
//!
//! - `message` - Hot reload message types (connected, reload)
//! - `path` - URL resolution over routes and serving roots
//! - `response` - HTTP responses and reload client injection
//! - `server` - [`ReloadServer`], the HTTP + WebSocket implementation
//! - `ws` - WebSocket client registry and broadcast

pub mod message;
mod path;
mod response;
mod server;
mod ws;

pub use server::ReloadServer;

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::asset::Asset;
use crate::config::Config;
use crate::transform::Transform;

/// Opaque live-reload service.
pub trait LiveReload: Send + Sync {
    /// Start serving. Called once by the dev server after its watches exist.
    fn init(&self, options: &ServerOptions) -> Result<()>;

    /// Notify clients that `paths` changed. A no-op before `init`.
    fn reload(&self, paths: &[PathBuf]);
}

/// Server settings handed to [`LiveReload::init`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerOptions {
    pub interface: IpAddr,
    pub port: u16,
    pub ws_port: u16,
    /// Show a toast in the browser on every reload
    pub notify: bool,
    /// Directories served in priority order
    pub roots: Vec<PathBuf>,
    /// URL prefix (without slashes) to directory
    pub routes: Vec<(String, PathBuf)>,
}

impl ServerOptions {
    /// Serving roots are `[temp, src, public]`; routes resolve against the root.
    pub fn from_config(config: &Config) -> Self {
        let serve = &config.serve;
        Self {
            interface: serve.interface,
            port: serve.port,
            ws_port: serve.ws_port,
            notify: serve.notify,
            roots: vec![config.temp_dir(), config.src_dir(), config.public_dir()],
            routes: serve
                .routes
                .iter()
                .map(|(prefix, dir)| (prefix.trim_matches('/').to_string(), config.root_join(dir)))
                .collect(),
        }
    }
}

/// Transform adapter that reports every asset it sees, then passes it on.
pub struct ReloadStream {
    reload: Arc<dyn LiveReload>,
}

impl ReloadStream {
    pub fn new(reload: Arc<dyn LiveReload>) -> Self {
        Self { reload }
    }
}

impl Transform for ReloadStream {
    fn name(&self) -> &'static str {
        "reload"
    }

    fn apply(&self, assets: Vec<Asset>) -> Result<Vec<Asset>> {
        if !assets.is_empty() {
            let paths: Vec<PathBuf> = assets.iter().map(|a| a.path.clone()).collect();
            self.reload.reload(&paths);
        }
        Ok(assets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_server_options_from_config() {
        let config = Config::default().with_root(Path::new("/site"));
        let options = ServerOptions::from_config(&config);

        assert_eq!(options.port, 2080);
        assert!(!options.notify);
        assert_eq!(
            options.roots,
            vec![
                PathBuf::from("/site/temp"),
                PathBuf::from("/site/src"),
                PathBuf::from("/site/public"),
            ]
        );
        assert_eq!(
            options.routes,
            vec![("node_modules".to_string(), PathBuf::from("/site/node_modules"))]
        );
    }

    #[test]
    fn test_stream_passes_assets_through() {
        let stream = ReloadStream::new(Arc::new(ReloadServer::new()));
        let assets = vec![Asset::new("a.css", "a{}")];
        assert_eq!(stream.apply(assets.clone()).unwrap(), assets);
    }
}
