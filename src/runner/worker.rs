use std::future::Future;

use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tracing::{error, info};

use crate::bench::{Credentials, RunResult};
use crate::error::{AppResult, WorkerError, WorkerFault};

use super::target::BenchTarget;
use super::wire::{FailureMessage, ReportMessage, WireMessage, read_message, send_message};

/// Worker-process side: read one assignment from stdin, run it, answer on
/// stdout.
///
/// A failed run is reported to the parent rather than returned, so the
/// worker itself only fails when the pipe does.
///
/// # Errors
///
/// Returns wire errors reading the assignment or writing the reply.
pub(crate) async fn serve() -> AppResult<()> {
    let mut input = BufReader::new(tokio::io::stdin());
    let mut output = tokio::io::stdout();
    serve_on(&mut input, &mut output, |target| async move {
        target.run_once().await
    })
    .await
}

async fn serve_on<R, W, F, Fut>(input: &mut R, output: &mut W, run: F) -> AppResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    F: FnOnce(BenchTarget) -> Fut,
    Fut: Future<Output = AppResult<RunResult>>,
{
    let assignment = match read_message(input).await? {
        WireMessage::Assignment(assignment) => *assignment,
        other => {
            return Err(WorkerError::UnexpectedMessage {
                expected: "assignment",
                received: other.kind(),
            }
            .into());
        }
    };
    let worker = assignment.worker;
    info!("Worker {} starting against {}", worker, assignment.hostname);
    let target = BenchTarget::new(
        Credentials::new(assignment.username, assignment.password),
        assignment.hostname,
        assignment.config,
    );

    let reply = match run(target).await {
        Ok(actions) => {
            info!("Worker {} recorded {} measurements", worker, actions.len());
            WireMessage::Report(ReportMessage { worker, actions })
        }
        Err(err) => {
            error!("Worker {} failed: {}", worker, err);
            WireMessage::Failure(FailureMessage {
                worker,
                error: WorkerFault::from(&err),
            })
        }
    };
    send_message(output, &reply).await
}

#[cfg(test)]
mod tests {
    use crate::config::types::BenchConfig;
    use crate::error::{AppError, ConfigError, ConfigFault};
    use crate::runner::wire::AssignmentMessage;

    use super::*;

    async fn assignment_bytes(worker: usize) -> AppResult<Vec<u8>> {
        let mut bytes = Vec::new();
        send_message(
            &mut bytes,
            &WireMessage::Assignment(Box::new(AssignmentMessage {
                worker,
                username: "admin".to_owned(),
                password: "secret".to_owned(),
                hostname: "sat.example.com".to_owned(),
                config: BenchConfig::default(),
            })),
        )
        .await?;
        Ok(bytes)
    }

    #[tokio::test(flavor = "current_thread")]
    async fn run_error_is_reported_as_failure() -> AppResult<()> {
        let input = assignment_bytes(5).await?;
        let mut reader = BufReader::new(input.as_slice());
        let mut output = Vec::new();
        serve_on(&mut reader, &mut output, |target| async move {
            if target.credentials.username != "admin" || target.hostname != "sat.example.com" {
                return Err(AppError::worker("assignment was not unpacked"));
            }
            Err(AppError::config(ConfigError::OrganizationNotFound {
                name: "benchmark-org-0".to_owned(),
            }))
        })
        .await?;

        let mut reply = BufReader::new(output.as_slice());
        match read_message(&mut reply).await? {
            WireMessage::Failure(FailureMessage {
                worker: 5,
                error:
                    WorkerFault::Config {
                        fault: ConfigFault::OrganizationNotFound { name },
                    },
            }) if name == "benchmark-org-0" => Ok(()),
            other => Err(AppError::worker(format!("unexpected reply {:?}", other))),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn successful_run_is_reported() -> AppResult<()> {
        let input = assignment_bytes(0).await?;
        let mut reader = BufReader::new(input.as_slice());
        let mut output = Vec::new();
        serve_on(&mut reader, &mut output, |_| async { Ok(Vec::new()) }).await?;

        let mut reply = BufReader::new(output.as_slice());
        match read_message(&mut reply).await? {
            WireMessage::Report(ReportMessage { worker: 0, .. }) => Ok(()),
            other => Err(AppError::worker(format!("unexpected reply {:?}", other))),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn non_assignment_input_is_rejected() -> AppResult<()> {
        let input: &[u8] = b"{\"type\":\"report\",\"worker\":0,\"actions\":[]}\n";
        let mut reader = BufReader::new(input);
        let mut output = Vec::new();
        match serve_on(&mut reader, &mut output, |_| async { Ok(Vec::new()) }).await {
            Err(AppError::Worker(WorkerError::UnexpectedMessage {
                received: "report", ..
            })) => {}
            other => return Err(AppError::worker(format!("unexpected: {:?}", other))),
        }
        if !output.is_empty() {
            return Err(AppError::worker("nothing should be written"));
        }
        Ok(())
    }
}
