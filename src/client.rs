use futures_util::{Stream, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::accumulator::{ChunkAccumulator, Snapshot};
use crate::config::ClientConfig;
use crate::error::{AppError, Result};
use crate::stream::StreamDecoder;

const USER_AGENT: &str = concat!("AppForge/", env!("CARGO_PKG_VERSION"));

/// Streams one generation request from the backend into a [`Snapshot`].
#[derive(Clone, Debug)]
pub struct GenerationClient {
    http: reqwest::Client,
    endpoint: reqwest::Url,
}

impl GenerationClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            endpoint: config.endpoint()?,
        })
    }

    pub fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }

    /// Send `description` and accumulate the streamed files.
    ///
    /// Every applied chunk's snapshot is sent on `progress`; a receiver that
    /// went away cancels the stream. The returned snapshot is the table as it
    /// stood when the transport closed.
    pub async fn generate(
        &self,
        description: &str,
        progress: Option<&mpsc::Sender<Snapshot>>,
    ) -> Result<Snapshot> {
        info!(endpoint = %self.endpoint, "starting generation");
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .json(&serde_json::json!({ "description": description }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Transport {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }
        if response.content_length() == Some(0) {
            return Err(AppError::MissingBody);
        }

        consume(response.bytes_stream(), progress).await
    }
}

/// Drive decoder and accumulator over a body stream, yielding to `progress`
/// after every applied chunk.
async fn consume<S, B, E>(stream: S, progress: Option<&mpsc::Sender<Snapshot>>) -> Result<Snapshot>
where
    S: Stream<Item = std::result::Result<B, E>>,
    B: AsRef<[u8]>,
    AppError: From<E>,
{
    let mut stream = std::pin::pin!(stream);
    let mut decoder = StreamDecoder::new();
    let mut accumulator = ChunkAccumulator::new();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for line in decoder.push(chunk.as_ref()) {
            let Some(snapshot) = accumulator.apply(&line)? else {
                continue;
            };
            if let Some(tx) = progress {
                tx.send(snapshot).await.map_err(|_| AppError::Cancelled)?;
            }
        }
    }

    if let Some(residual) = decoder.finish() {
        warn!(line = %residual, "dropping unterminated final line");
    }

    let snapshot = accumulator.snapshot();
    info!(
        files = snapshot.len(),
        chunks = accumulator.applied(),
        "generation finished"
    );
    Ok(snapshot)
}

/// The backend's `detail` field when present, else the status text.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").cloned());
    match detail {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Null) | None => status
            .canonical_reason()
            .map(String::from)
            .unwrap_or_else(|| status.as_u16().to_string()),
        Some(other) => other.to_string(),
    }
}
