//! One rebuild worker per watch binding.
//!
//! Changed paths accumulate in a pending list; the channel of capacity one
//! only carries the wake-up. While a run is in flight the worker is not
//! receiving, so the first trigger during the run takes the slot and every
//! later one just adds its paths: a burst collapses into a single follow-up
//! run that sees all of them, and runs of the same binding never overlap.

use std::mem;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};

use super::{WatchAction, WatchBinding};
use crate::logger::{status_error, status_success};
use crate::reload::LiveReload;

/// Outcome of [`Worker::trigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// Queued for the next run.
    Queued,
    /// A follow-up run is already pending; the paths join it.
    Coalesced,
    /// The worker is gone.
    Closed,
}

pub struct Worker {
    tx: mpsc::Sender<()>,
    pending: Arc<Mutex<Vec<PathBuf>>>,
    in_flight: Arc<AtomicUsize>,
}

impl Worker {
    /// Spawn on the current tokio runtime.
    ///
    /// `in_flight` counts queued plus running batches and may be shared by
    /// several workers.
    pub fn spawn(
        binding: Arc<WatchBinding>,
        reload: Arc<dyn LiveReload>,
        in_flight: Arc<AtomicUsize>,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<()>(1);
        let pending = Arc::new(Mutex::new(Vec::new()));

        let queue = Arc::clone(&pending);
        let counter = Arc::clone(&in_flight);
        tokio::spawn(async move {
            while rx.recv().await.is_some() {
                let paths = mem::take(&mut *queue.lock());
                if !paths.is_empty() {
                    run_batch(&binding, &reload, paths).await;
                }
                counter.fetch_sub(1, Ordering::AcqRel);
            }
        });

        Self {
            tx,
            pending,
            in_flight,
        }
    }

    /// Request a run for `paths` without waiting.
    pub fn trigger(&self, paths: Vec<PathBuf>) -> Trigger {
        {
            let mut pending = self.pending.lock();
            for path in paths {
                if !pending.contains(&path) {
                    pending.push(path);
                }
            }
        }

        // Count before sending so the worker never decrements first.
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        match self.tx.try_send(()) {
            Ok(()) => Trigger::Queued,
            Err(err) => {
                self.in_flight.fetch_sub(1, Ordering::AcqRel);
                match err {
                    TrySendError::Full(()) => Trigger::Coalesced,
                    TrySendError::Closed(()) => Trigger::Closed,
                }
            }
        }
    }
}

/// Run the binding's action once and report the outcome.
///
/// Failures are logged; the worker keeps serving later triggers.
async fn run_batch(binding: &WatchBinding, reload: &Arc<dyn LiveReload>, paths: Vec<PathBuf>) {
    match binding.action() {
        WatchAction::Run(task) => {
            let task = Arc::clone(task);
            let name = task.name().to_string();
            match tokio::task::spawn_blocking(move || task.run()).await {
                Ok(Ok(())) => status_success(&format!("rebuilt: {name}")),
                Ok(Err(e)) => status_error(&format!("{name} failed"), &format!("{e:#}")),
                Err(e) => status_error(&format!("{name} panicked"), &e.to_string()),
            }
        }
        WatchAction::Reload => {
            let reload = Arc::clone(reload);
            let count = paths.len();
            match tokio::task::spawn_blocking(move || reload.reload(&paths)).await {
                Ok(()) => status_success(&format!("reload: {count} file(s)")),
                Err(e) => status_error("reload panicked", &e.to_string()),
            }
        }
    }
}
