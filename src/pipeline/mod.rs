//! Task pipelines.
//!
//! A [`Pipeline`] is a static tree of tasks:
//!
//! ```text
//! build   = series(clean, parallel(series(compile, useref)))
//! compile = parallel(style, script, page)
//! develop = series(compile, serve)
//! ```
//!
//! `Sequential` members run strictly one after another and the first
//! failure skips the rest. `Parallel` members run on the rayon pool; the
//! pipeline completes when all members complete, and the first failure is
//! reported.

mod clean;
mod compose;
mod postprocess;

pub use clean::{CleanTask, remove_all};
pub use compose::{Pipelines, Transforms};
pub use postprocess::PostProcess;

use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use rayon::prelude::*;

use crate::debug;

/// A named unit of work.
pub trait Task: Send + Sync {
    fn name(&self) -> &str;

    fn run(&self) -> Result<()>;
}

/// Static composition of tasks.
#[derive(Clone)]
pub enum Pipeline {
    Task(Arc<dyn Task>),
    Parallel(Vec<Pipeline>),
    Sequential(Vec<Pipeline>),
}

impl Pipeline {
    pub fn task(task: Arc<dyn Task>) -> Self {
        Self::Task(task)
    }

    /// Run to completion. Task failures carry the task name as context.
    pub fn run(&self) -> Result<()> {
        match self {
            Self::Task(task) => {
                let start = Instant::now();
                debug!(task.name(); "starting");
                task.run()
                    .with_context(|| format!("task `{}` failed", task.name()))?;
                debug!(task.name(); "finished in {:.2?}", start.elapsed());
                Ok(())
            }
            Self::Parallel(members) => members.par_iter().try_for_each(Pipeline::run),
            Self::Sequential(members) => members.iter().try_for_each(Pipeline::run),
        }
    }

    /// Shape of the pipeline, e.g. `series(clean, parallel(style, script))`.
    pub fn describe(&self) -> String {
        let join = |members: &[Pipeline]| {
            members
                .iter()
                .map(Pipeline::describe)
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self {
            Self::Task(task) => task.name().to_string(),
            Self::Parallel(members) => format!("parallel({})", join(members)),
            Self::Sequential(members) => format!("series({})", join(members)),
        }
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.describe())
    }
}
