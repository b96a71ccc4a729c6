//! Fan-out of independent workload runs.
//!
//! One worker runs inline in the calling task. More than one are all
//! launched first and then joined in launch order; the first failure seen
//! while joining aborts the join and the remaining workers are dropped.
mod process;
mod target;
pub(crate) mod wire;
pub(crate) mod worker;

use std::num::NonZeroUsize;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::bench::RunResult;
use crate::error::{AppResult, WorkerError};

pub use process::ProcessLauncher;
pub use target::BenchTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerStatus {
    /// Launched, not yet waited on.
    Spawned,
    /// The runner is waiting for its result.
    Running,
    Joined,
    Failed,
}

/// A launched worker. Dropping an unjoined handle aborts it.
#[derive(Debug)]
pub struct WorkerHandle {
    index: usize,
    status: WorkerStatus,
    task: Option<JoinHandle<AppResult<RunResult>>>,
}

impl WorkerHandle {
    #[must_use]
    pub const fn new(index: usize, task: JoinHandle<AppResult<RunResult>>) -> Self {
        Self {
            index,
            status: WorkerStatus::Spawned,
            task: Some(task),
        }
    }

    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub const fn status(&self) -> WorkerStatus {
        self.status
    }

    /// Waits for the worker's run result.
    ///
    /// # Errors
    ///
    /// Returns the worker's own error, [`WorkerError::Join`] when its task
    /// panicked, or [`WorkerError::AlreadyJoined`] on a second join.
    pub async fn join(&mut self) -> AppResult<RunResult> {
        let Some(task) = self.task.take() else {
            return Err(WorkerError::AlreadyJoined { worker: self.index }.into());
        };
        self.status = WorkerStatus::Running;
        let outcome = match task.await {
            Ok(result) => result,
            Err(source) => Err(WorkerError::Join {
                worker: self.index,
                source,
            }
            .into()),
        };
        self.status = if outcome.is_ok() {
            WorkerStatus::Joined
        } else {
            WorkerStatus::Failed
        };
        outcome
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Where workload runs execute.
#[async_trait]
pub trait WorkerLauncher: Send + Sync {
    /// Runs one workload in the calling task.
    async fn run_inline(&self) -> AppResult<RunResult>;

    /// Starts worker `index` and returns without waiting for it.
    async fn launch(&self, index: usize) -> AppResult<WorkerHandle>;
}

pub struct ParallelRunner<L> {
    launcher: L,
}

impl<L> ParallelRunner<L>
where
    L: WorkerLauncher,
{
    #[must_use]
    pub const fn new(launcher: L) -> Self {
        Self { launcher }
    }

    /// Returns one run result per worker, indexed by worker.
    ///
    /// # Errors
    ///
    /// Returns the first launch error, or the first worker failure in join
    /// order. Results collected before the failure are discarded.
    pub async fn run_all(&self, workers: NonZeroUsize) -> AppResult<Vec<RunResult>> {
        let count = workers.get();
        if count == 1 {
            info!("Running a single workload inline");
            return Ok(vec![self.launcher.run_inline().await?]);
        }

        info!("Launching {} workers", count);
        let mut handles = Vec::with_capacity(count);
        for index in 0..count {
            handles.push(self.launcher.launch(index).await?);
        }

        let mut results = Vec::with_capacity(count);
        for handle in &mut handles {
            match handle.join().await {
                Ok(result) => results.push(result),
                Err(err) => {
                    error!("Worker {} failed: {}", handle.index(), err);
                    return Err(err);
                }
            }
        }
        info!("Joined {} workers", results.len());
        Ok(results)
    }
}
