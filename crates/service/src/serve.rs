// SPDX-License-Identifier: Apache-2.0
//! Newline-delimited JSON request loop over stdio.

use std::sync::Arc;

use rdc_core::{
    model::DiagnosticsRequest,
    testing::{MockHost, StubAnalyzerReference},
    Coordinator,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// One line of the wire protocol: a request plus the project state it
/// should run against, since this stand-in transport has no separate
/// workspace-tracking channel.
#[derive(Debug, serde::Deserialize)]
struct WireRequest {
    request: DiagnosticsRequest,
    language: String,
    #[serde(default)]
    documents: Vec<String>,
}

/// Errors reading or writing the stdio transport. Distinct from
/// [`rdc_core::CoordinatorError`], which only ever covers one request's
/// outcome.
#[derive(Debug, thiserror::Error)]
pub enum ServeError {
    /// The line wasn't valid JSON for [`WireRequest`].
    #[error("malformed request line: {0}")]
    MalformedRequest(#[source] serde_json::Error),
    /// stdin/stdout I/O failed.
    #[error("transport I/O error: {0}")]
    Io(#[source] std::io::Error),
}

/// Serves requests from `stdin` until EOF or `shutdown` fires, writing each
/// result (or error) as one JSON line to `stdout`.
///
/// Uses [`MockHost`] as the analyzer host: this repository coordinates
/// analysis work but does not itself implement a real compiler/analyzer
/// backend, so the mock stands in for whatever `HostAdapter` a concrete
/// deployment would plug in.
pub async fn serve_stdio(shutdown: CancellationToken) -> Result<(), ServeError> {
    let host = Arc::new(MockHost::new());
    let references: Vec<Box<dyn rdc_core::AnalyzerReference>> =
        vec![Box::new(StubAnalyzerReference::new(vec![
            "syntax", "semantic",
        ]))];
    let coordinator = Coordinator::new(host, references);

    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        let line = tokio::select! {
            _ = shutdown.cancelled() => {
                tracing::info!("shutdown requested, stopping request loop");
                return Ok(());
            }
            line = lines.next_line() => line.map_err(ServeError::Io)?,
        };

        let Some(line) = line else {
            return Ok(());
        };
        if line.trim().is_empty() {
            continue;
        }

        let wire: WireRequest = match serde_json::from_str(&line) {
            Ok(wire) => wire,
            Err(err) => {
                warn!(error = %err, "dropping malformed request line");
                continue;
            }
        };

        let documents = wire.documents.into_iter().map(rdc_common::DocumentId::new);
        let project = rdc_core::model::ProjectHandle::new(
            wire.request.project.clone(),
            wire.language,
            documents,
            [],
        );

        let result = coordinator
            .get_diagnostics(project, wire.request, CancellationToken::new())
            .await;

        let payload = match result {
            Ok(result) => serde_json::to_string(&result),
            Err(err) => serde_json::to_string(&serde_json::json!({ "error": err.to_string() })),
        }
        .map_err(ServeError::MalformedRequest)?;

        if let Err(err) = stdout.write_all(payload.as_bytes()).await {
            error!(error = %err, "failed to write response");
            return Err(ServeError::Io(err));
        }
        let _ = stdout.write_all(b"\n").await;
        let _ = stdout.flush().await;
    }
}
