//! taskqueue serve: JSON-lines tool transport over stdin/stdout
//!
//! One request per line:
//!
//! ```text
//! {"id": 1, "tool": "read_task", "arguments": {"projectId": "proj-1", "taskId": "task-1"}}
//! ```
//!
//! One response per line, echoing `id`:
//!
//! ```text
//! {"id": 1, "status": "success", "data": {...}}
//! {"id": 1, "status": "error", "error": {"kind": "NotFoundError", "message": "...", "code": 2}}
//! ```
//!
//! Requests run concurrently on the blocking pool; the manager lock
//! serializes them, so responses may arrive out of request order.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::manager::TaskManager;
use crate::store::StateStore;
use crate::tools::{ToolOutcome, ToolRegistry};

/// Options for `taskqueue serve`
pub struct ServeOptions {
    pub config: Config,
}

/// Incoming request line
#[derive(Debug, Deserialize)]
pub struct ToolRequest {
    #[serde(default)]
    pub id: Value,
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub arguments: Value,
}

/// Outgoing response line
#[derive(Debug, Serialize)]
pub struct ToolReply {
    pub id: Value,
    #[serde(flatten)]
    pub outcome: ToolOutcome,
}

pub fn run(options: ServeOptions) -> Result<()> {
    let manager = Arc::new(TaskManager::from_config(&options.config)?);
    let registry = Arc::new(ToolRegistry::new());

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async move {
        tracing::info!("serving tool requests on stdin");
        let stdin = BufReader::new(tokio::io::stdin());
        serve_lines(manager, registry, stdin, tokio::io::stdout()).await?;
        tracing::info!("stdin closed; shutting down");
        Ok::<(), Error>(())
    })
}

/// Answer every request line from `reader` on `writer` until EOF.
///
/// Returns the writer once all in-flight requests have been answered.
pub async fn serve_lines<S, R, W>(
    manager: Arc<TaskManager<S>>,
    registry: Arc<ToolRegistry<S>>,
    reader: R,
    writer: W,
) -> Result<W>
where
    S: StateStore + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer_task = tokio::spawn(async move {
        let mut writer = writer;
        while let Some(line) = rx.recv().await {
            writer.write_all(line.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;
        }
        Ok::<W, std::io::Error>(writer)
    });

    let mut in_flight = JoinSet::new();
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let request: ToolRequest = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                tracing::warn!(error = %err, "malformed request line");
                let reply = ToolReply {
                    id: Value::Null,
                    outcome: ToolOutcome::from_result(Err(Error::InvalidArgument(format!(
                        "invalid request: {err}"
                    )))),
                };
                send_reply(&tx, &reply)?;
                continue;
            }
        };

        let manager = Arc::clone(&manager);
        let registry = Arc::clone(&registry);
        let tx = tx.clone();
        in_flight.spawn_blocking(move || {
            let outcome = registry.invoke(&manager, &request.tool, request.arguments);
            tracing::debug!(tool = %request.tool, success = outcome.is_success(), "request handled");
            send_reply(
                &tx,
                &ToolReply {
                    id: request.id,
                    outcome,
                },
            )
        });
    }

    while let Some(joined) = in_flight.join_next().await {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(err)) => tracing::warn!(error = %err, "failed to send reply"),
            Err(err) => tracing::warn!(error = %err, "request handler panicked"),
        }
    }

    drop(tx);
    let writer = writer_task
        .await
        .map_err(|err| Error::OperationFailed(format!("response writer stopped: {err}")))??;
    Ok(writer)
}

fn send_reply(tx: &mpsc::UnboundedSender<String>, reply: &ToolReply) -> Result<()> {
    let line = serde_json::to_string(reply)?;
    tx.send(line)
        .map_err(|_| Error::OperationFailed("response channel closed".to_string()))
}
