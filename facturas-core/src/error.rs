//! Error taxonomy for the invoice pipeline.
//!
//! Conflicts from the analysis backend carry a server-provided message that
//! must reach the user verbatim (duplicate detection is a business rule),
//! so they get their own variant instead of folding into a generic failure.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// Storage-layer failure. No automatic retry; the caller decides.
    #[error("No se pudo subir el archivo: {0}")]
    UploadFailed(String),

    /// Duplicate document detected by the analysis backend. The message is
    /// the server's, verbatim, with no prefix.
    #[error("{0}")]
    AnalysisConflict(String),

    /// Any other extraction failure.
    #[error("Error al analizar el documento: {0}")]
    AnalysisFailed(String),

    /// A required field is missing or invalid. Raised before any network
    /// call is issued.
    #[error("{0}")]
    ValidationFailed(String),

    #[error("No se pudo aprobar la factura: {0}")]
    ApprovalFailed(String),

    #[error("No se pudo rechazar la factura: {0}")]
    RejectionFailed(String),

    /// Any other backend read/write failure.
    #[error("Error del servidor: {0}")]
    Backend(String),
}

impl PipelineError {
    /// True for the duplicate-submission case, which callers may want to
    /// present differently from ordinary failures.
    pub fn is_conflict(&self) -> bool {
        matches!(self, PipelineError::AnalysisConflict(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_message_is_verbatim() {
        let err = PipelineError::AnalysisConflict("Este documento ya fue analizado".to_string());
        assert_eq!(err.to_string(), "Este documento ya fue analizado");
        assert!(err.is_conflict());
    }

    #[test]
    fn test_analysis_failure_carries_prefix() {
        let err = PipelineError::AnalysisFailed("timeout".to_string());
        assert!(err.to_string().starts_with("Error al analizar"));
        assert!(!err.is_conflict());
    }
}
