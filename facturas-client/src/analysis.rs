//! The analysis backend client: one call that creates the invoice record
//! and triggers server-side extraction of the uploaded document.

use reqwest::StatusCode;
use serde::Serialize;

use facturas_core::{PipelineError, RawInvoice};

use crate::{authorize, ApiConfig};

#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    cfg: ApiConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest<'a> {
    file: &'a str,
    proyect: &'a str,
    category: &'a str,
    company: &'a str,
}

impl AnalysisClient {
    pub fn new(cfg: ApiConfig) -> Self {
        Self { http: reqwest::Client::new(), cfg }
    }

    /// Analyze a stored document. A 409 means the backend recognized a
    /// duplicate submission; its message is a business-rule answer and is
    /// surfaced verbatim. A response without an extracted issue date is
    /// still a success — the invoice exists, just with incomplete fields.
    pub async fn analyze(
        &self,
        durable_url: &str,
        proyect_id: &str,
        category_key: &str,
    ) -> Result<RawInvoice, PipelineError> {
        let body = AnalyzeRequest {
            file: durable_url,
            proyect: proyect_id,
            category: category_key,
            company: &self.cfg.company_id,
        };

        tracing::debug!(file = %durable_url, proyect = %proyect_id, "requesting analysis");

        let resp = authorize(
            self.http
                .post(format!("{}/api/facturas/analizar", self.cfg.base_url))
                .json(&body),
            &self.cfg,
        )
        .send()
        .await
        .map_err(|e| PipelineError::AnalysisFailed(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::CONFLICT {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::AnalysisConflict(conflict_message(&text)));
        }
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::AnalysisFailed(format!("{status} {text}")));
        }

        let invoice: RawInvoice = resp
            .json()
            .await
            .map_err(|e| PipelineError::AnalysisFailed(e.to_string()))?;

        if invoice.extracted().fecha_emision.is_none() {
            tracing::warn!(id = %invoice.id, "analysis yielded no issue date; keeping invoice");
        }
        Ok(invoice)
    }
}

/// Pull the server's message out of a conflict body. JSON bodies carry it
/// under `message`; anything else passes through as-is.
fn conflict_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
