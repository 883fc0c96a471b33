//! The sequential pipeline orchestrator.
//!
//! Every operation here is a chain of explicit awaits with no parallelism:
//! the overview loads the unfiltered collection, waits, then loads the
//! filtered one, so counts and the displayed list come from consistent
//! snapshots. State-changing calls are always followed by a full reload
//! rather than an in-place patch.

use chrono::{NaiveDate, Utc};
use chrono_tz::America::Lima;

use facturas_core::{
    normalize, transition_fields, validate_transition, Decision, Filter, NormalizedInvoice,
    PipelineError, ReferenceMaps, Status,
};

use crate::analysis::AnalysisClient;
use crate::invoices::{InvoiceClient, SortOrder};
use crate::references::ReferenceClient;
use crate::storage::StorageClient;
use crate::ApiConfig;

/// Unfiltered status counts plus the filtered list, computed sequentially.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub invoices: Vec<NormalizedInvoice>,
}

pub struct Pipeline {
    storage: StorageClient,
    analysis: AnalysisClient,
    invoices: InvoiceClient,
    references: ReferenceClient,
    refs: ReferenceMaps,
}

impl Pipeline {
    pub fn new(cfg: ApiConfig) -> Self {
        Self {
            storage: StorageClient::new(cfg.clone()),
            analysis: AnalysisClient::new(cfg.clone()),
            invoices: InvoiceClient::new(cfg.clone()),
            references: ReferenceClient::new(cfg),
            refs: ReferenceMaps::default(),
        }
    }

    pub fn references(&self) -> &ReferenceClient {
        &self.references
    }

    pub fn invoices(&self) -> &InvoiceClient {
        &self.invoices
    }

    pub fn reference_maps(&self) -> &ReferenceMaps {
        &self.refs
    }

    /// Rebuild the reference snapshot. Reads and rebuilds never overlap;
    /// the pipeline is driven from a single event loop.
    pub async fn refresh_references(&mut self) -> Result<(), PipelineError> {
        self.refs = self.references.load_maps().await?;
        Ok(())
    }

    /// Upload a document, then analyze it: the full intake path. Progress
    /// events (floored at 10%) are forwarded to `on_progress`; the upload
    /// must finish before analysis starts.
    pub async fn submit_document(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        proyect_id: &str,
        category_key: &str,
        on_progress: impl FnMut(u8),
    ) -> Result<NormalizedInvoice, PipelineError> {
        let destination = format!("facturas/{file_name}");
        let handle = self.storage.upload(bytes, &destination);
        let durable_url = handle.wait(on_progress).await?;

        let raw = self
            .analysis
            .analyze(&durable_url, proyect_id, category_key)
            .await?;
        Ok(normalize(&raw, &self.refs))
    }

    /// Load and normalize the invoice list for a filter. Server-side
    /// filtering handles the coarse dimensions; the local predicate is
    /// re-applied so amount bounds and display-value matches hold too.
    pub async fn load_invoices(
        &self,
        filter: &Filter,
    ) -> Result<Vec<NormalizedInvoice>, PipelineError> {
        let raw = self
            .invoices
            .list(filter, Some("createdAt"), SortOrder::Desc)
            .await?;
        Ok(raw
            .iter()
            .map(|r| normalize(r, &self.refs))
            .filter(|n| facturas_core::filter::matches(n, filter))
            .collect())
    }

    /// Two-step sequential load: the unfiltered collection first (global
    /// status counts), then the filtered view.
    pub async fn load_overview(&self, filter: &Filter) -> Result<Overview, PipelineError> {
        let all = self.load_invoices(&Filter::new()).await?;
        let count = |s: Status| all.iter().filter(|i| i.status == s).count();
        let (total, pending, approved, rejected) = (
            all.len(),
            count(Status::Pending),
            count(Status::Approved),
            count(Status::Rejected),
        );

        let invoices = if filter.is_empty() {
            all
        } else {
            self.load_invoices(filter).await?
        };

        Ok(Overview { total, pending, approved, rejected, invoices })
    }

    /// Apply an operator decision: validate locally, stamp, PATCH, then
    /// reload the collection so local state resynchronizes with the source
    /// of truth. On a backend refusal the reload still happens and the
    /// record keeps its previous state.
    pub async fn decide(
        &self,
        id: &str,
        decision: Decision,
    ) -> Result<Vec<NormalizedInvoice>, PipelineError> {
        // Payload validation happens before any network traffic.
        facturas_core::approval::validate_decision(&decision)?;

        let current = self.invoices.by_id(id).await?;
        validate_transition(current.status, &decision)?;

        let stamp = transition_fields(&decision, today_lima());
        let outcome = match &decision {
            Decision::Approve { .. } => self.invoices.approve(id, &stamp).await,
            Decision::Reject { .. } => self.invoices.reject(id, &stamp).await,
        };

        let reloaded = self.load_invoices(&Filter::new()).await;
        match outcome {
            Ok(()) => reloaded,
            Err(err) => {
                if let Err(reload_err) = &reloaded {
                    tracing::warn!(%reload_err, "resync reload failed after refused transition");
                }
                Err(err)
            }
        }
    }
}

fn today_lima() -> NaiveDate {
    Utc::now().with_timezone(&Lima).date_naive()
}
