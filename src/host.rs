//! Line-delimited JSON message host.
//!
//! Each input line is one request, either `{"actionName", "selectedText"}` or
//! `{"fileUrl", "fileType", "prompt"}`, optionally with an `id`. Each is answered with
//! one line holding `{"data"}` or `{"error"}` and the same `id`. Requests run
//! concurrently, so answers may come back out of order.

use crate::dispatch::Dispatcher;
use crate::fetch::FileType;
use crate::settings::SettingsStore;
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(flatten)]
    request: HostRequest,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum HostRequest {
    Text {
        #[serde(rename = "actionName")]
        action_name: String,
        #[serde(rename = "selectedText")]
        selected_text: String,
    },
    File {
        #[serde(rename = "fileUrl")]
        file_url: String,
        #[serde(rename = "fileType")]
        file_type: FileType,
        prompt: String,
    },
}

#[derive(Debug, Serialize)]
struct HostResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<serde_json::Value>,
    #[serde(flatten)]
    body: ResponseBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum ResponseBody {
    Data(String),
    Error(String),
}

async fn handle<S: SettingsStore>(dispatcher: &Dispatcher<S>, line: &str) -> HostResponse {
    let envelope: Envelope = match serde_json::from_str(line) {
        Ok(e) => e,
        Err(e) => {
            return HostResponse {
                id: None,
                body: ResponseBody::Error(format!("invalid request: {e}")),
            }
        }
    };

    let result = match &envelope.request {
        HostRequest::Text {
            action_name,
            selected_text,
        } => dispatcher.dispatch(action_name, selected_text).await,
        HostRequest::File {
            file_url,
            file_type,
            prompt,
        } => dispatcher.dispatch_multimodal(file_url, *file_type, prompt).await,
    };

    HostResponse {
        id: envelope.id,
        body: match result {
            Ok(reply) => ResponseBody::Data(reply.text),
            Err(e) => ResponseBody::Error(e.to_string()),
        },
    }
}

/// Serve requests from `input` until EOF, then wait for outstanding answers.
///
/// Returns the writer once everything has been flushed.
pub async fn run<S, R, W>(dispatcher: Arc<Dispatcher<S>>, input: R, mut output: W) -> anyhow::Result<W>
where
    S: SettingsStore + 'static,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, mut rx) = mpsc::channel::<HostResponse>(64);

    let writer = tokio::spawn(async move {
        while let Some(resp) = rx.recv().await {
            let mut line = serde_json::to_vec(&resp).context("failed to encode response")?;
            line.push(b'\n');
            output.write_all(&line).await.context("failed to write response")?;
            output.flush().await.context("failed to flush response")?;
        }
        anyhow::Ok(output)
    });

    let mut lines = input.lines();
    let mut served = 0usize;
    while let Some(line) = lines.next_line().await.context("failed to read request")? {
        if line.trim().is_empty() {
            continue;
        }
        served += 1;
        let dispatcher = Arc::clone(&dispatcher);
        let tx = tx.clone();
        tokio::spawn(async move {
            let resp = handle(&dispatcher, &line).await;
            // The writer only stops early on an I/O error, which `run` reports.
            let _ = tx.send(resp).await;
        });
    }
    drop(tx);
    tracing::debug!(served, "input closed; waiting for outstanding requests");

    writer.await.context("response writer panicked")?
}
