//! Process-wide state for develop mode.
//!
//! - `SHUTDOWN`: Has shutdown been requested? (Ctrl+C received)
//! - `SERVER`: HTTP server to unblock on shutdown
//! - `SHUTDOWN_TX`: Signal for the watch loop

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;

/// Shutdown has been requested (Ctrl+C received)
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// HTTP server reference for graceful shutdown
static SERVER: OnceLock<Arc<Server>> = OnceLock::new();

/// Shutdown signal sender for the watch loop
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Exit code used when Ctrl+C interrupts a one-shot pipeline.
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Setup the global Ctrl+C handler. Call once at program start
///
/// The handler behavior depends on what has been registered:
/// - Nothing registered (`clean`, `build`, initial compile): exit immediately
/// - Watch loop and/or server registered: graceful shutdown
pub fn setup_shutdown_handler() -> anyhow::Result<()> {
    ctrlc::set_handler(|| {
        SHUTDOWN.store(true, Ordering::SeqCst);

        let tx = SHUTDOWN_TX.get();
        let server = SERVER.get();
        if tx.is_none() && server.is_none() {
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }

        crate::log!("serve"; "shutting down...");
        if let Some(tx) = tx {
            let _ = tx.send(());
        }
        if let Some(server) = server {
            server.unblock();
        }
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
}

/// Register the HTTP server for graceful shutdown
pub fn register_server(server: Arc<Server>) {
    let _ = SERVER.set(server);
}

/// Register the watch loop's shutdown signal
pub fn register_shutdown(shutdown_tx: crossbeam::channel::Sender<()>) {
    let _ = SHUTDOWN_TX.set(shutdown_tx);
}

/// Check if shutdown has been requested
///
/// Uses Relaxed ordering for performance - worst case is processing
/// a few more items before stopping, which is acceptable
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
