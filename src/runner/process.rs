use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::BufReader;
use tokio::process::{Child, Command};
use tracing::{debug, warn};

use crate::bench::RunResult;
use crate::error::{AppError, AppResult, WorkerError};

use super::target::BenchTarget;
use super::wire::{AssignmentMessage, WireMessage, read_message, send_message};
use super::{WorkerHandle, WorkerLauncher};

/// Hidden flag that turns the binary into a worker.
pub(crate) const WORKER_FLAG: &str = "--worker";

/// Runs each worker as a child process of the current executable.
///
/// The assignment goes to the child's stdin and the result comes back on
/// its stdout; stderr is inherited so worker logs reach the terminal.
/// Children are killed when their handle is dropped.
pub struct ProcessLauncher {
    target: BenchTarget,
    program: PathBuf,
}

impl ProcessLauncher {
    /// # Errors
    ///
    /// Returns an I/O error when the current executable cannot be located.
    pub fn new(target: BenchTarget) -> AppResult<Self> {
        let program = std::env::current_exe()?;
        Ok(Self { target, program })
    }

    fn assignment(&self, worker: usize) -> WireMessage {
        WireMessage::Assignment(Box::new(AssignmentMessage {
            worker,
            username: self.target.credentials.username.clone(),
            password: self.target.credentials.password.clone(),
            hostname: self.target.hostname.clone(),
            config: self.target.config.clone(),
        }))
    }
}

#[async_trait]
impl WorkerLauncher for ProcessLauncher {
    async fn run_inline(&self) -> AppResult<RunResult> {
        self.target.run_once().await
    }

    async fn launch(&self, index: usize) -> AppResult<WorkerHandle> {
        let child = Command::new(&self.program)
            .arg(WORKER_FLAG)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| WorkerError::Spawn {
                worker: index,
                source,
            })?;
        debug!("Spawned worker {} as pid {:?}", index, child.id());
        let assignment = self.assignment(index);
        Ok(WorkerHandle::new(
            index,
            tokio::spawn(supervise(index, child, assignment)),
        ))
    }
}

async fn supervise(index: usize, mut child: Child, assignment: WireMessage) -> AppResult<RunResult> {
    let mut stdin = child.stdin.take().ok_or(WorkerError::MissingPipe {
        worker: index,
        pipe: "stdin",
    })?;
    let stdout = child.stdout.take().ok_or(WorkerError::MissingPipe {
        worker: index,
        pipe: "stdout",
    })?;

    send_message(&mut stdin, &assignment).await?;
    drop(stdin);

    let mut reader = BufReader::new(stdout);
    let message = match read_message(&mut reader).await {
        Ok(message) => message,
        Err(AppError::Worker(WorkerError::ConnectionClosed)) => {
            let status = wait(index, &mut child).await?;
            return Err(WorkerError::Exited {
                worker: index,
                status,
            }
            .into());
        }
        Err(err) => return Err(err),
    };
    let status = wait(index, &mut child).await?;
    debug!("Worker {} exited ({})", index, status);
    interpret(index, message)
}

async fn wait(index: usize, child: &mut Child) -> AppResult<String> {
    let status = child.wait().await.map_err(|source| WorkerError::Io {
        context: "wait for worker",
        source,
    })?;
    if !status.success() {
        warn!("Worker {} exited with {}", index, status);
    }
    Ok(status.to_string())
}

/// Turns a worker's reply into its run result or re-raised error.
fn interpret(index: usize, message: WireMessage) -> AppResult<RunResult> {
    match message {
        WireMessage::Report(report) => {
            if report.worker != index {
                warn!("Worker {} reported as worker {}", index, report.worker);
            }
            Ok(report.actions)
        }
        WireMessage::Failure(failure) => Err(failure.error.into_app_error(index)),
        WireMessage::Assignment(_) => Err(WorkerError::UnexpectedMessage {
            expected: "report or failure",
            received: "assignment",
        }
        .into()),
    }
}
