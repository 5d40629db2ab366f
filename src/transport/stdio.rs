//! Stdio transport: line-delimited JSON-RPC over stdin/stdout (spec §4.6).
//!
//! Reads are cooperative and single-threaded; each request is dispatched
//! onto its own task so `tools/call` concurrency still applies, but writes
//! are serialised through a single mutex-guarded stdout handle so responses
//! never interleave mid-line.

use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::Mutex;

use crate::core::cancel::CancellationToken;
use crate::core::dispatcher::Dispatcher;
use crate::core::protocol::RpcResponse;
use crate::errors::ServerError;

pub async fn run(dispatcher: Arc<Dispatcher>) -> Result<(), ServerError> {
    let stdin = tokio::io::stdin();
    let stdout = Arc::new(Mutex::new(BufWriter::new(tokio::io::stdout())));
    let mut lines = BufReader::new(stdin).lines();

    let mut tasks = tokio::task::JoinSet::new();

    loop {
        let line = lines
            .next_line()
            .await
            .map_err(|e| ServerError::Transport(format!("stdin read failed: {e}")))?;
        let Some(line) = line else {
            tracing::info!("stdin closed, shutting down");
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let dispatcher = Arc::clone(&dispatcher);
        let stdout = Arc::clone(&stdout);
        let line = line.to_string();
        tasks.spawn(async move {
            let response = match Dispatcher::parse_request(line.as_bytes()) {
                Ok(request) => {
                    let token = CancellationToken::new();
                    dispatcher.handle(&token, request).await
                }
                Err(e) => RpcResponse::err(Value::Null, crate::core::protocol::RpcError::new(e.code(), e.to_string())),
            };
            write_response(&stdout, &response).await;
        });
    }

    while tasks.join_next().await.is_some() {}
    Ok(())
}

async fn write_response(stdout: &Arc<Mutex<BufWriter<tokio::io::Stdout>>>, response: &RpcResponse) {
    let Ok(mut serialised) = serde_json::to_string(response) else {
        tracing::error!("failed to serialise response");
        return;
    };
    serialised.push('\n');
    let mut guard = stdout.lock().await;
    if let Err(e) = guard.write_all(serialised.as_bytes()).await {
        tracing::error!(error = %e, "failed to write response to stdout");
        return;
    }
    let _ = guard.flush().await;
}
