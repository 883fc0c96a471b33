//! Streaming file upload with a progress channel.
//!
//! The body goes out in chunks; each chunk advances an integer percentage
//! on an unbounded channel. A floor of 10% is emitted immediately on start
//! so a consumer never renders a stalled 0%, and the floor event also
//! guarantees at least one progress observation before the result
//! resolves. No automatic retry: a failed upload surfaces `UploadFailed`
//! and retrying means calling `upload` again.

use futures_util::stream;
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use facturas_core::PipelineError;

use crate::{authorize, ApiConfig};

const CHUNK_SIZE: usize = 64 * 1024;
const PROGRESS_FLOOR: u8 = 10;

/// A running upload: drain `progress`, then await `result` for the durable
/// URL.
pub struct UploadHandle {
    pub progress: mpsc::UnboundedReceiver<u8>,
    pub result: JoinHandle<Result<String, PipelineError>>,
}

impl UploadHandle {
    /// Drain remaining progress events and await the terminal result.
    pub async fn wait(mut self, mut on_progress: impl FnMut(u8)) -> Result<String, PipelineError> {
        while let Some(pct) = self.progress.recv().await {
            on_progress(pct);
        }
        match self.result.await {
            Ok(result) => result,
            Err(join) => Err(PipelineError::UploadFailed(join.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StorageClient {
    http: reqwest::Client,
    cfg: ApiConfig,
}

#[derive(Deserialize)]
struct UploadResponse {
    url: String,
}

impl StorageClient {
    pub fn new(cfg: ApiConfig) -> Self {
        Self { http: reqwest::Client::new(), cfg }
    }

    /// Start an upload of `bytes` to `destination_path`. Returns
    /// immediately; the transfer runs on a spawned task.
    pub fn upload(&self, bytes: Vec<u8>, destination_path: &str) -> UploadHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let http = self.http.clone();
        let cfg = self.cfg.clone();
        let path = destination_path.to_string();

        let result = tokio::spawn(async move {
            tracing::debug!(path = %path, len = bytes.len(), "starting upload");

            // Floor event first: progress is observed before any outcome.
            let _ = tx.send(PROGRESS_FLOOR);

            let percentages = progress_sequence(bytes.len(), CHUNK_SIZE);
            let chunks: Vec<Vec<u8>> = bytes.chunks(CHUNK_SIZE.max(1)).map(<[u8]>::to_vec).collect();

            let progress_tx = tx.clone();
            let body = reqwest::Body::wrap_stream(stream::iter(
                chunks
                    .into_iter()
                    .zip(percentages)
                    .map(move |(chunk, pct)| {
                        let _ = progress_tx.send(pct);
                        Ok::<_, std::io::Error>(chunk)
                    }),
            ));

            let resp = authorize(
                http.post(format!("{}/upload", cfg.storage_base_url))
                    .query(&[("path", path.as_str())])
                    .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
                    .body(body),
                &cfg,
            )
            .send()
            .await
            .map_err(|e| PipelineError::UploadFailed(e.to_string()))?;

            let status = resp.status();
            if !status.is_success() {
                let detail = resp.text().await.unwrap_or_default();
                return Err(PipelineError::UploadFailed(format!("{status} {detail}")));
            }

            let out: UploadResponse = resp
                .json()
                .await
                .map_err(|e| PipelineError::UploadFailed(e.to_string()))?;
            tracing::debug!(url = %out.url, "upload complete");
            Ok(out.url)
        });

        UploadHandle { progress: rx, result }
    }
}

/// Per-chunk percentages for a transfer: floored at 10, monotonically
/// non-decreasing, ending at 100 for any non-empty input.
fn progress_sequence(total: usize, chunk_size: usize) -> Vec<u8> {
    let total = total.max(1);
    let chunk_size = chunk_size.max(1);
    let mut sent = 0usize;
    let mut points = Vec::new();
    while sent < total {
        sent = (sent + chunk_size).min(total);
        let pct = ((sent * 100) / total) as u8;
        points.push(pct.max(PROGRESS_FLOOR));
    }
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_sequence_floor_and_terminal() {
        let points = progress_sequence(CHUNK_SIZE * 10, CHUNK_SIZE);
        assert_eq!(points.first(), Some(&PROGRESS_FLOOR));
        assert_eq!(points.last(), Some(&100));
        assert!(points.windows(2).all(|w| w[0] <= w[1]), "monotonic");
    }

    #[test]
    fn test_progress_sequence_small_file_is_single_jump() {
        // A file smaller than one chunk goes 0 → 100 in one event.
        assert_eq!(progress_sequence(100, CHUNK_SIZE), vec![100]);
    }

    #[test]
    fn test_progress_sequence_raw_zero_is_coerced() {
        // Early chunks of a large transfer would report under 10%; the
        // floor keeps them at 10.
        let points = progress_sequence(CHUNK_SIZE * 50, CHUNK_SIZE);
        assert!(points.iter().all(|p| *p >= PROGRESS_FLOOR));
        assert_eq!(points[0], PROGRESS_FLOOR);
    }

    #[tokio::test]
    async fn test_failed_upload_surfaces_upload_failed() {
        // Unroutable endpoint: the result must be UploadFailed and at
        // least one progress event must precede it.
        let client = StorageClient::new(ApiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            storage_base_url: "http://127.0.0.1:1".to_string(),
            company_id: "c-1".to_string(),
            token: None,
        });

        let handle = client.upload(vec![0u8; 4096], "facturas/test.pdf");
        let mut events = Vec::new();
        let result = handle.wait(|pct| events.push(pct)).await;

        assert!(matches!(result, Err(PipelineError::UploadFailed(_))));
        assert!(!events.is_empty());
        assert_eq!(events[0], PROGRESS_FLOOR);
    }
}
