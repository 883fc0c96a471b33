//! facturas-client: async boundary clients for the invoice pipeline —
//! storage upload, document analysis, the invoice backend, the reference
//! backend, and the sequential orchestrator that ties them together.

pub mod analysis;
pub mod invoices;
pub mod pipeline;
pub mod references;
pub mod storage;

pub use analysis::AnalysisClient;
pub use invoices::{InvoiceClient, SortOrder, UpdateFields};
pub use pipeline::{Overview, Pipeline};
pub use references::ReferenceClient;
pub use storage::{StorageClient, UploadHandle};

/// Connection settings shared by every boundary client.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Invoice/reference/analysis backend, e.g. `https://api.example.pe`.
    pub base_url: String,
    /// Storage provider endpoint for binary uploads.
    pub storage_base_url: String,
    /// Tenant identifier sent with every backend call.
    pub company_id: String,
    /// Optional bearer token.
    pub token: Option<String>,
}

pub(crate) fn authorize(
    req: reqwest::RequestBuilder,
    cfg: &ApiConfig,
) -> reqwest::RequestBuilder {
    match &cfg.token {
        Some(token) => req.bearer_auth(token),
        None => req,
    }
}
