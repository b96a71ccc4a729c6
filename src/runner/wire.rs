use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::bench::RunResult;
use crate::config::types::BenchConfig;
use crate::error::{AppError, AppResult, WorkerError, WorkerFault};

pub(crate) const MAX_MESSAGE_BYTES: usize = 64 * 1024 * 1024;

/// One line of the parent/worker exchange.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum WireMessage {
    Assignment(Box<AssignmentMessage>),
    Report(ReportMessage),
    Failure(FailureMessage),
}

impl WireMessage {
    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            WireMessage::Assignment(_) => "assignment",
            WireMessage::Report(_) => "report",
            WireMessage::Failure(_) => "failure",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct AssignmentMessage {
    pub(crate) worker: usize,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) hostname: String,
    pub(crate) config: BenchConfig,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct ReportMessage {
    pub(crate) worker: usize,
    pub(crate) actions: RunResult,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FailureMessage {
    pub(crate) worker: usize,
    pub(crate) error: WorkerFault,
}

pub(crate) async fn read_message<R>(reader: &mut R) -> AppResult<WireMessage>
where
    R: AsyncBufRead + Unpin,
{
    read_message_within(reader, MAX_MESSAGE_BYTES).await
}

/// Reads one line of at most `max_bytes` (newline excluded). Never buffers
/// more than `max_bytes + 1` bytes, however long the incoming line is.
async fn read_message_within<R>(reader: &mut R, max_bytes: usize) -> AppResult<WireMessage>
where
    R: AsyncBufRead + Unpin,
{
    let limit = u64::try_from(max_bytes)
        .unwrap_or(u64::MAX)
        .saturating_add(1);
    let mut buffer: Vec<u8> = Vec::with_capacity(max_bytes.min(1024));
    let bytes = (&mut *reader)
        .take(limit)
        .read_until(b'\n', &mut buffer)
        .await
        .map_err(|err| {
            AppError::worker(WorkerError::Io {
                context: "read wire message",
                source: err,
            })
        })?;
    if bytes == 0 {
        return Err(AppError::worker(WorkerError::ConnectionClosed));
    }
    if buffer.ends_with(b"\n") {
        buffer.pop();
        if buffer.ends_with(b"\r") {
            buffer.pop();
        }
    }
    if buffer.len() > max_bytes {
        return Err(AppError::worker(WorkerError::WireMessageTooLarge { max_bytes }));
    }
    let line = std::str::from_utf8(&buffer)
        .map_err(|err| AppError::worker(WorkerError::WireMessageInvalidUtf8 { source: err }))?;
    serde_json::from_str::<WireMessage>(line).map_err(|err| {
        AppError::worker(WorkerError::Deserialize {
            context: "wire message",
            source: err,
        })
    })
}

pub(crate) async fn send_message<W>(writer: &mut W, message: &WireMessage) -> AppResult<()>
where
    W: AsyncWrite + Unpin,
{
    let mut payload = serde_json::to_string(message).map_err(|err| {
        AppError::worker(WorkerError::Serialize {
            context: "wire message",
            source: err,
        })
    })?;
    payload.push('\n');
    writer.write_all(payload.as_bytes()).await.map_err(|err| {
        AppError::worker(WorkerError::Io {
            context: "send wire message",
            source: err,
        })
    })?;
    writer.flush().await.map_err(|err| {
        AppError::worker(WorkerError::Io {
            context: "flush wire message",
            source: err,
        })
    })
}

#[cfg(test)]
mod tests {
    use tokio::io::BufReader;

    use crate::error::RpcError;

    use super::*;

    #[tokio::test(flavor = "current_thread")]
    async fn failure_message_crosses_a_pipe() -> AppResult<()> {
        let (mut parent, child) = tokio::io::duplex(4096);
        let fault = WorkerFault::Rpc {
            error: RpcError::Transport {
                endpoint: "https://sat.example.com/rpc/api".to_owned(),
                message: "connection refused".to_owned(),
            },
        };
        send_message(
            &mut parent,
            &WireMessage::Failure(FailureMessage {
                worker: 3,
                error: fault.clone(),
            }),
        )
        .await?;
        drop(parent);

        let mut reader = BufReader::new(child);
        match read_message(&mut reader).await? {
            WireMessage::Failure(FailureMessage { worker: 3, error }) if error == fault => {}
            other => {
                return Err(AppError::worker(format!("unexpected message: {:?}", other)));
            }
        }
        match read_message(&mut reader).await {
            Err(AppError::Worker(WorkerError::ConnectionClosed)) => Ok(()),
            other => Err(AppError::worker(format!("expected closed pipe, got {:?}", other))),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn read_message_accepts_crlf_and_rejects_garbage() -> AppResult<()> {
        let input: &[u8] = b"{\"type\":\"report\",\"worker\":0,\"actions\":[]}\r\nnot json\n";
        let mut reader = BufReader::new(input);
        match read_message(&mut reader).await? {
            WireMessage::Report(ReportMessage { worker: 0, actions }) if actions.is_empty() => {}
            other => {
                return Err(AppError::worker(format!("unexpected message: {:?}", other)));
            }
        }
        match read_message(&mut reader).await {
            Err(AppError::Worker(WorkerError::Deserialize { .. })) => Ok(()),
            other => Err(AppError::worker(format!("expected parse failure, got {:?}", other))),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn oversized_line_is_rejected_without_reading_it_all() -> AppResult<()> {
        let mut input = vec![b'x'; 4096];
        input.push(b'\n');
        let mut reader = BufReader::new(input.as_slice());
        match read_message_within(&mut reader, 16).await {
            Err(AppError::Worker(WorkerError::WireMessageTooLarge { max_bytes: 16 })) => {}
            other => {
                return Err(AppError::worker(format!("expected size error, got {:?}", other)));
            }
        }
        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).await?;
        if rest.len() != 4080 {
            return Err(AppError::worker(format!(
                "reader consumed {} bytes",
                4097_usize.saturating_sub(rest.len())
            )));
        }
        Ok(())
    }
}
