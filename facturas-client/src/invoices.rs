//! Invoice backend client: list, read, update, approve, reject, delete.
//!
//! The list endpoint is the legacy one: its date params travel as
//! `DD-MM-YYYY`, while update payloads use ISO dates. Both conversions go
//! through `facturas_core::dates` so the shim stays in one place.

use serde::Serialize;

use facturas_core::{dates, Filter, PipelineError, RawInvoice, TransitionFields};

use crate::{authorize, ApiConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

/// Editable invoice fields for a PATCH update. Dates here are in whatever
/// form the operator typed; they are re-encoded to ISO on the way out.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ruc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serie: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlativo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha_emision: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub moneda: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monto_total: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proyect: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl UpdateFields {
    /// ISO-encode the issue date; an unparsable value passes through
    /// verbatim, matching the normalizer's fallback policy.
    fn encoded(mut self) -> Self {
        self.fecha_emision = self.fecha_emision.map(|d| dates::to_iso_or_verbatim(&d));
        self
    }
}

#[derive(Debug, Clone)]
pub struct InvoiceClient {
    http: reqwest::Client,
    cfg: ApiConfig,
}

impl InvoiceClient {
    pub fn new(cfg: ApiConfig) -> Self {
        Self { http: reqwest::Client::new(), cfg }
    }

    fn url(&self, tail: &str) -> String {
        format!("{}/api/facturas{}", self.cfg.base_url, tail)
    }

    /// List invoices for the company, server-side filtered and sorted.
    pub async fn list(
        &self,
        filter: &Filter,
        sort_by: Option<&str>,
        order: SortOrder,
    ) -> Result<Vec<RawInvoice>, PipelineError> {
        let mut query: Vec<(&str, String)> =
            vec![("company", self.cfg.company_id.clone()), ("sortOrder", order.as_str().to_string())];
        if let Some(sort) = sort_by {
            query.push(("sortBy", sort.to_string()));
        }
        if let Some(p) = &filter.proyect {
            query.push(("proyect", p.clone()));
        }
        if let Some(c) = &filter.category {
            query.push(("category", c.clone()));
        }
        if let Some(s) = filter.status {
            query.push(("status", s.as_str().to_string()));
        }
        // Legacy endpoint: date bounds as DD-MM-YYYY.
        if let Some(from) = filter.date_from {
            query.push(("fechaInicio", dates::format_legacy(from)));
        }
        if let Some(to) = filter.date_to {
            query.push(("fechaFin", dates::format_legacy(to)));
        }

        tracing::debug!(?query, "listing invoices");
        let resp = authorize(self.http.get(self.url("")).query(&query), &self.cfg)
            .send()
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))?;
        read_json(resp).await
    }

    pub async fn by_id(&self, id: &str) -> Result<RawInvoice, PipelineError> {
        let resp = authorize(
            self.http
                .get(self.url(&format!("/{id}")))
                .query(&[("company", self.cfg.company_id.as_str())]),
            &self.cfg,
        )
        .send()
        .await
        .map_err(|e| PipelineError::Backend(e.to_string()))?;
        read_json(resp).await
    }

    pub async fn update(&self, id: &str, fields: UpdateFields) -> Result<RawInvoice, PipelineError> {
        let resp = authorize(
            self.http
                .patch(self.url(&format!("/{id}")))
                .query(&[("company", self.cfg.company_id.as_str())])
                .json(&fields.encoded()),
            &self.cfg,
        )
        .send()
        .await
        .map_err(|e| PipelineError::Backend(e.to_string()))?;
        read_json(resp).await
    }

    /// Issue a confirmed approval stamp. The caller has already validated
    /// the transition; a backend refusal leaves local state untouched.
    pub async fn approve(&self, id: &str, stamp: &TransitionFields) -> Result<(), PipelineError> {
        self.patch_status(id, stamp)
            .await
            .map_err(|e| PipelineError::ApprovalFailed(e.to_string()))
    }

    pub async fn reject(&self, id: &str, stamp: &TransitionFields) -> Result<(), PipelineError> {
        self.patch_status(id, stamp)
            .await
            .map_err(|e| PipelineError::RejectionFailed(e.to_string()))
    }

    async fn patch_status(&self, id: &str, stamp: &TransitionFields) -> anyhow::Result<()> {
        let resp = authorize(
            self.http
                .patch(self.url(&format!("/{id}/status")))
                .query(&[("company", self.cfg.company_id.as_str())])
                .json(stamp),
            &self.cfg,
        )
        .send()
        .await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            anyhow::bail!("{status} {text}");
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), PipelineError> {
        let resp = authorize(self.http.delete(self.url(&format!("/{id}"))), &self.cfg)
            .send()
            .await
            .map_err(|e| PipelineError::Backend(e.to_string()))?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(PipelineError::Backend(format!("{status} {text}")));
        }
        Ok(())
    }
}

pub(crate) async fn read_json<T: serde::de::DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, PipelineError> {
    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(PipelineError::Backend(format!("{status} {text}")));
    }
    resp.json::<T>()
        .await
        .map_err(|e| PipelineError::Backend(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_fields_encode_issue_date_to_iso() {
        let fields = UpdateFields {
            fecha_emision: Some("04/03/2025".to_string()),
            ..UpdateFields::default()
        }
        .encoded();
        assert_eq!(fields.fecha_emision.as_deref(), Some("2025-03-04"));

        // Unparsable dates pass through verbatim.
        let fields = UpdateFields {
            fecha_emision: Some("sin fecha".to_string()),
            ..UpdateFields::default()
        }
        .encoded();
        assert_eq!(fields.fecha_emision.as_deref(), Some("sin fecha"));
    }

    #[test]
    fn test_update_payload_skips_unset_fields() {
        let fields = UpdateFields {
            monto_total: Some("120.00".to_string()),
            ..UpdateFields::default()
        };
        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["montoTotal"], "120.00");
        assert!(json.get("ruc").is_none());
        assert!(json.get("fechaEmision").is_none());
    }
}
