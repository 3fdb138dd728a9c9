//! Live-reload development server.
//!
//! `init` binds the HTTP server (static files with the reload client
//! injected) and the WebSocket hub; `reload` broadcasts changed paths.

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::thread;

use anyhow::{Context, Result, bail};
use tiny_http::{Request, Server};

use super::message::HotReloadMessage;
use super::path::ServeRoots;
use super::response;
use super::ws::WsHub;
use super::{LiveReload, ServerOptions};
use crate::core::{is_shutdown, register_server};
use crate::embed::{HOTRELOAD_URL, HotreloadVars};
use crate::{debug, log};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Worker threads answering HTTP requests.
const REQUEST_THREADS: usize = 4;

/// Browser-sync style static server with WebSocket reload notifications.
#[derive(Default)]
pub struct ReloadServer {
    hub: OnceLock<Arc<WsHub>>,
}

/// Everything a request handler needs, shared across worker threads.
struct Site {
    roots: ServeRoots,
    hotreload: HotreloadVars,
}

impl ReloadServer {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LiveReload for ReloadServer {
    fn init(&self, options: &ServerOptions) -> Result<()> {
        if self.hub.get().is_some() {
            bail!("live reload server already initialized");
        }

        let hub = WsHub::start(options.interface, options.ws_port)?;
        let (server, addr) = bind_with_retry(options.interface, options.port)?;
        let server = Arc::new(server);
        register_server(Arc::clone(&server));

        let site = Arc::new(Site {
            roots: ServeRoots {
                routes: options.routes.clone(),
                roots: options.roots.clone(),
            },
            hotreload: HotreloadVars {
                ws_port: hub.port(),
                notify: options.notify,
            },
        });

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(REQUEST_THREADS)
            .thread_name(|i| format!("http-{i}"))
            .build()
            .context("failed to create request thread pool")?;
        thread::Builder::new()
            .name("http-accept".into())
            .spawn(move || run_request_loop(&server, &pool, &site))
            .context("failed to spawn HTTP server")?;

        log!("serve"; "http://{}", addr);
        let _ = self.hub.set(hub);
        Ok(())
    }

    fn reload(&self, paths: &[PathBuf]) {
        // no-op until init: tasks flagged for reload also run during build
        let Some(hub) = self.hub.get() else {
            return;
        };
        debug!("reload"; "{} path(s) changed", paths.len());
        hub.broadcast(&HotReloadMessage::reload(paths));
    }
}

/// Bind to the specified interface and port, with automatic port retry.
pub fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                let addr = server.server_addr().to_ip().unwrap_or(addr);
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, addr.port());
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

fn run_request_loop(server: &Server, pool: &rayon::ThreadPool, site: &Arc<Site>) {
    for request in server.incoming_requests() {
        let site = Arc::clone(site);
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &site) {
                log!("serve"; "request error: {e}");
            }
        });
    }
}

/// Handle a single HTTP request
fn handle_request(request: Request, site: &Site) -> Result<()> {
    // Early exit if shutdown requested
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    // Serve the reload client from memory
    if request.url() == HOTRELOAD_URL {
        return response::respond_hotreload_js(request, &site.hotreload);
    }

    match site.roots.resolve(request.url()) {
        Some(path) => response::respond_file(request, &path),
        None => {
            debug!("serve"; "404 {}", request.url());
            response::respond_not_found(request)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::{Ipv4Addr, TcpStream};

    #[test]
    fn test_reload_before_init_is_noop() {
        let server = ReloadServer::new();
        server.reload(&[PathBuf::from("a.css")]);
        assert!(server.hub.get().is_none());
    }

    #[test]
    fn test_bind_with_retry_skips_taken_port() {
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);
        let (first, addr) = bind_with_retry(localhost, 0).unwrap();
        let (_second, next) = bind_with_retry(localhost, addr.port()).unwrap();
        assert_ne!(addr.port(), next.port());
        drop(first);
    }

    #[test]
    fn test_handle_request_serves_and_injects() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("index.html"), "<body>hi</body>").unwrap();

        let site = Site {
            roots: ServeRoots {
                routes: Vec::new(),
                roots: vec![dir.path().to_path_buf()],
            },
            hotreload: HotreloadVars {
                ws_port: 35729,
                notify: false,
            },
        };
        let server = Server::http("127.0.0.1:0").unwrap();
        let port = server.server_addr().to_ip().unwrap().port();

        let mut client = TcpStream::connect(("127.0.0.1", port)).unwrap();
        client
            .write_all(b"GET / HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .unwrap();
        let request = server.recv().unwrap();
        handle_request(request, &site).unwrap();

        client
            .set_read_timeout(Some(std::time::Duration::from_secs(2)))
            .unwrap();
        let mut bytes = Vec::new();
        let _ = client.read_to_end(&mut bytes);
        let raw = String::from_utf8_lossy(&bytes);
        assert!(raw.starts_with("HTTP/1.1 200"), "{raw}");
        assert!(raw.contains(HOTRELOAD_URL), "{raw}");
    }
}
