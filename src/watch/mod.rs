//! Development server: file watching and live reload.
//!
//! ```text
//! notify ──▶ Debouncer ──▶ route() ──▶ Worker (per binding) ──▶ Task / reload
//! ```
//!
//! # Module Structure
//!
//! - `debouncer` - Timing and dedup of raw notify events
//! - `worker` - Per-binding rebuild worker with an in-flight guard
//!
//! Bindings are registered before the live-reload service starts, so no
//! change made after the server answers is lost.

mod debouncer;
mod worker;


use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use glob::Pattern;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;

use crate::asset::{TaskError, compile, matches};
use crate::config::Config;
use crate::core::register_shutdown;
use crate::pipeline::Task;
use crate::reload::{LiveReload, ServerOptions};
use crate::utils::path::normalize_path;
use crate::{debug, log};

use debouncer::Debouncer;
use worker::{Trigger, Worker};

/// What a matching change does.
#[derive(Clone)]
pub enum WatchAction {
    /// Rerun the task; it reports its own outputs to the reload service.
    Run(Arc<dyn Task>),
    /// Tell the browser the files changed.
    Reload,
}

/// A glob under a base directory and the action it triggers.
pub struct WatchBinding {
    glob: String,
    base: PathBuf,
    action: WatchAction,
}

impl WatchBinding {
    pub fn new(glob: impl Into<String>, base: impl Into<PathBuf>, action: WatchAction) -> Self {
        Self {
            glob: glob.into(),
            base: base.into(),
            action,
        }
    }

    pub fn glob(&self) -> &str {
        &self.glob
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn action(&self) -> &WatchAction {
        &self.action
    }

    /// Human-readable label for logs.
    pub fn label(&self) -> &str {
        match &self.action {
            WatchAction::Run(task) => task.name(),
            WatchAction::Reload => "reload",
        }
    }
}

/// Compiled form of a binding, with its base normalized like event paths.
struct Matcher {
    base: PathBuf,
    pattern: Pattern,
}

impl Matcher {
    fn new(binding: &WatchBinding) -> Result<Self, TaskError> {
        Ok(Self {
            base: normalize_path(&binding.base),
            pattern: compile(&binding.glob)?,
        })
    }

    fn is_match(&self, path: &Path) -> bool {
        path.strip_prefix(&self.base)
            .is_ok_and(|rel| matches(&self.pattern, rel))
    }
}

/// Group changed paths by the index of every binding they match.
///
/// Bindings come back in registration order; paths keep their order.
fn route(matchers: &[Matcher], changed: &[PathBuf]) -> Vec<(usize, Vec<PathBuf>)> {
    matchers
        .iter()
        .enumerate()
        .filter_map(|(index, matcher)| {
            let hits: Vec<PathBuf> = changed
                .iter()
                .filter(|path| matcher.is_match(path))
                .cloned()
                .collect();
            (!hits.is_empty()).then_some((index, hits))
        })
        .collect()
}

// ============================================================================
// state
// ============================================================================

/// Watcher lifecycle. Only process shutdown ends it.
///
/// `Triggered` lasts while any worker has a batch queued or running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WatchState {
    Idle = 0,
    Watching = 1,
    Triggered = 2,
}

struct StateCell(AtomicU8);

impl StateCell {
    const fn new() -> Self {
        Self(AtomicU8::new(WatchState::Idle as u8))
    }

    fn set(&self, state: WatchState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn get(&self) -> WatchState {
        match self.0.load(Ordering::Acquire) {
            1 => WatchState::Watching,
            2 => WatchState::Triggered,
            _ => WatchState::Idle,
        }
    }
}

// ============================================================================
// dev server
// ============================================================================

/// The `serve` task: watch sources, rerun tasks, drive the live reload.
pub struct DevServer {
    config: Arc<Config>,
    bindings: Vec<Arc<WatchBinding>>,
    reload: Arc<dyn LiveReload>,
    state: StateCell,
    in_flight: Arc<AtomicUsize>,
}

impl DevServer {
    pub fn new(
        config: Arc<Config>,
        bindings: Vec<WatchBinding>,
        reload: Arc<dyn LiveReload>,
    ) -> Self {
        Self {
            config,
            bindings: bindings.into_iter().map(Arc::new).collect(),
            reload,
            state: StateCell::new(),
            in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn state(&self) -> WatchState {
        match self.state.get() {
            WatchState::Watching if self.in_flight.load(Ordering::Acquire) > 0 => {
                WatchState::Triggered
            }
            state => state,
        }
    }

    pub fn bindings(&self) -> &[Arc<WatchBinding>] {
        &self.bindings
    }

    /// One worker per binding, all feeding the shared in-flight count.
    fn spawn_workers(&self) -> Vec<Worker> {
        self.bindings
            .iter()
            .map(|b| {
                Worker::spawn(
                    Arc::clone(b),
                    Arc::clone(&self.reload),
                    Arc::clone(&self.in_flight),
                )
            })
            .collect()
    }

    /// Existing binding bases, deduplicated, in registration order.
    fn watch_roots(&self) -> Vec<PathBuf> {
        let mut seen = FxHashSet::default();
        self.bindings
            .iter()
            .map(|b| normalize_path(b.base()))
            .filter(|base| base.is_dir() && seen.insert(base.clone()))
            .collect()
    }

    async fn serve(&self) -> Result<()> {
        let matchers = self
            .bindings
            .iter()
            .map(|b| Matcher::new(b))
            .collect::<Result<Vec<_>, _>>()?;

        // Watcher first: events buffer while the server starts.
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })
        .context("failed to create file watcher")?;
        for root in self.watch_roots() {
            watcher
                .watch(&root, RecursiveMode::Recursive)
                .with_context(|| format!("failed to watch {}", root.display()))?;
            debug!("watch"; "watching {}", root.display());
        }
        for binding in &self.bindings {
            debug!("watch"; "{} under {} -> {}", binding.glob(), binding.base().display(), binding.label());
        }
        self.state.set(WatchState::Watching);

        self.reload
            .init(&ServerOptions::from_config(&self.config))
            .context("failed to start live reload server")?;

        let (shutdown_tx, shutdown_rx) = crossbeam::channel::bounded::<()>(1);
        register_shutdown(shutdown_tx);
        let mut shutdown = tokio::task::spawn_blocking(move || {
            let _ = shutdown_rx.recv();
        });

        let (event_tx, mut event_rx) = mpsc::channel::<notify::Event>(64);
        std::thread::Builder::new()
            .name("watch-events".into())
            .spawn(move || {
                while let Ok(result) = notify_rx.recv() {
                    match result {
                        Ok(event) => {
                            if event_tx.blocking_send(event).is_err() {
                                break;
                            }
                        }
                        Err(e) => log!("watch"; "notify error: {}", e),
                    }
                }
            })
            .context("failed to spawn watch thread")?;

        let workers = self.spawn_workers();
        let mut debouncer = Debouncer::new();

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                Some(event) = event_rx.recv() => debouncer.add_event(&event),
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    let Some(changes) = debouncer.take_if_ready() else {
                        continue;
                    };
                    let paths: Vec<PathBuf> = changes.into_iter().map(|(path, _)| path).collect();
                    dispatch(&matchers, &workers, &self.bindings, &paths);
                }
            }
        }

        drop(watcher);
        Ok(())
    }
}

/// Hand each routed batch to its worker.
fn dispatch(
    matchers: &[Matcher],
    workers: &[Worker],
    bindings: &[Arc<WatchBinding>],
    paths: &[PathBuf],
) {
    for (index, hits) in route(matchers, paths) {
        let label = bindings[index].label();
        match workers[index].trigger(hits) {
            Trigger::Queued => debug!("watch"; "triggered {}", label),
            Trigger::Coalesced => debug!("watch"; "{} already pending, paths merged", label),
            Trigger::Closed => log!("watch"; "{} worker stopped", label),
        }
    }
}

impl Task for DevServer {
    fn name(&self) -> &str {
        "serve"
    }

    /// Runs until Ctrl+C.
    fn run(&self) -> Result<()> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .context("failed to build async runtime")?;
        let result = runtime.block_on(self.serve());
        runtime.shutdown_timeout(Duration::from_millis(500));
        result
    }
}
