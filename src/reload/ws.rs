//! WebSocket broadcast hub for live reload.
//!
//! An acceptor thread performs the handshake and registers each client;
//! [`WsHub::broadcast`] writes to every client and drops the ones that fail.
//! Writes carry a timeout, and the client list is unlocked while sending, so
//! a stalled browser neither blocks new connections nor stalls the watcher
//! for longer than [`WRITE_TIMEOUT`].

use std::io::ErrorKind;
use std::mem;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::message::HotReloadMessage;
use crate::core::is_shutdown;
use crate::{debug, log};

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Poll interval of the non-blocking acceptor.
const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Longest a single client write may block.
const WRITE_TIMEOUT: Duration = Duration::from_secs(1);

/// Connected browser clients.
pub struct WsHub {
    clients: Mutex<Vec<WebSocket<TcpStream>>>,
    /// Serializes broadcasts so each one sees every client.
    sending: Mutex<()>,
    port: u16,
}

impl WsHub {
    /// Bind near `base_port` and start accepting clients in the background.
    pub fn start(interface: IpAddr, base_port: u16) -> Result<Arc<Self>> {
        let (listener, port) = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
        listener
            .set_nonblocking(true)
            .context("failed to configure WebSocket listener")?;

        let hub = Arc::new(Self {
            clients: Mutex::new(Vec::new()),
            sending: Mutex::new(()),
            port,
        });

        let acceptor = Arc::clone(&hub);
        thread::Builder::new()
            .name("ws-accept".into())
            .spawn(move || acceptor.accept_loop(listener))
            .context("failed to spawn WebSocket acceptor")?;

        debug!("reload"; "ws://{}:{}", interface, port);
        Ok(hub)
    }

    /// Port the hub actually bound (may differ from the requested one).
    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn client_count(&self) -> usize {
        self.clients.lock().len()
    }

    fn accept_loop(&self, listener: TcpListener) {
        while !is_shutdown() {
            match listener.accept() {
                Ok((stream, addr)) => {
                    debug!("reload"; "client connected: {}", addr);
                    // Handshake in blocking mode
                    let _ = stream.set_nonblocking(false);
                    self.add_client(stream);
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => {
                    log!("reload"; "accept error: {}", e);
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }
    }

    fn add_client(&self, stream: TcpStream) {
        if let Err(e) = stream.set_write_timeout(Some(WRITE_TIMEOUT)) {
            log!("reload"; "failed to set write timeout: {}", e);
            return;
        }
        match tungstenite::accept(stream) {
            Ok(mut ws) => {
                let connected = HotReloadMessage::connected();
                if let Err(e) = ws.send(Message::Text(connected.to_json().into())) {
                    debug!("reload"; "failed to send connected message: {}", e);
                    return;
                }
                let mut clients = self.clients.lock();
                clients.push(ws);
                debug!("reload"; "{} client(s) connected", clients.len());
            }
            Err(e) => {
                log!("reload"; "handshake failed: {}", e);
            }
        }
    }

    /// Send a message to all connected clients
    pub fn broadcast(&self, msg: &HotReloadMessage) {
        let text = msg.to_json();
        let _sending = self.sending.lock();
        let mut targets = mem::take(&mut *self.clients.lock());
        if targets.is_empty() {
            debug!("reload"; "no clients connected");
            return;
        }

        targets.retain_mut(|ws| match ws.send(Message::Text(text.clone().into())) {
            Ok(()) => true,
            Err(e) => {
                debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
        let delivered = targets.len();

        // Clients accepted during the send go after the survivors.
        let mut clients = self.clients.lock();
        let joined = mem::replace(&mut *clients, targets);
        clients.extend(joined);
        debug!("reload"; "broadcast to {} client(s)", delivered);
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual_port = listener.local_addr()?.port();
                return Ok((listener, actual_port));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind WebSocket server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use std::path::PathBuf;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

    #[test]
    fn test_bind_retries_next_port() {
        let (first, port) = try_bind_port(LOCALHOST, 0, 1).unwrap();
        // the taken port forces the retry onto the next one
        let (_second, next) = try_bind_port(LOCALHOST, port, 2).unwrap();
        assert_ne!(next, port);
        drop(first);
    }

    fn wait_for_clients(hub: &WsHub, count: usize) {
        for _ in 0..50 {
            if hub.client_count() == count {
                return;
            }
            thread::sleep(Duration::from_millis(20));
        }
    }

    #[test]
    fn test_broadcast_reaches_client() {
        let hub = WsHub::start(LOCALHOST, 0).unwrap();
        let url = format!("ws://127.0.0.1:{}", hub.port());
        let (mut client, _) = tungstenite::connect(url).unwrap();

        let first = client.read().unwrap();
        assert!(first.to_text().unwrap().contains("connected"));

        wait_for_clients(&hub, 1);

        hub.broadcast(&HotReloadMessage::reload(&["a.css".into()]));
        let msg = client.read().unwrap();
        assert_eq!(
            HotReloadMessage::from_json(msg.to_text().unwrap()),
            Some(HotReloadMessage::Reload {
                paths: vec!["a.css".into()]
            })
        );
        assert_eq!(hub.client_count(), 1);
    }

    #[test]
    fn test_stalled_client_is_dropped_after_write_timeout() {
        let hub = WsHub::start(LOCALHOST, 0).unwrap();
        let url = format!("ws://127.0.0.1:{}", hub.port());
        // connected but never reads again
        let (mut client, _) = tungstenite::connect(url).unwrap();
        client.read().unwrap();
        wait_for_clients(&hub, 1);
        assert_eq!(
            hub.clients.lock()[0].get_ref().write_timeout().unwrap(),
            Some(WRITE_TIMEOUT)
        );

        // far larger than the socket buffers, so the write has to block
        let huge = PathBuf::from("a".repeat(64 * 1024 * 1024));
        let hub_sender = Arc::clone(&hub);
        let sender = thread::spawn(move || {
            let started = std::time::Instant::now();
            hub_sender.broadcast(&HotReloadMessage::reload(&[huge]));
            started.elapsed()
        });

        // the client list stays unlocked while the send is stuck
        thread::sleep(Duration::from_millis(200));
        let started = std::time::Instant::now();
        assert_eq!(hub.client_count(), 0);
        assert!(started.elapsed() < Duration::from_millis(100));

        let elapsed = sender.join().unwrap();
        assert!(elapsed < Duration::from_secs(10), "{elapsed:?}");
        assert_eq!(hub.client_count(), 0);
        drop(client);
    }
}
