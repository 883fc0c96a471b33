//! The invoice normalizer: raw record + reference snapshot → display view.
//!
//! Total and side-effect-free by contract. Extraction noise (malformed
//! JSON, unparsable dates or amounts) degrades to placeholders; it is never
//! surfaced as an error. Re-normalizing the same raw record against the
//! same reference maps always yields the same result.

use chrono::NaiveDate;
use serde::Serialize;

use crate::amount::Amount;
use crate::dates;
use crate::invoice::{RawInvoice, Status};
use crate::refs::ReferenceMaps;

/// Placeholder for any display field the extraction did not yield.
pub const NOT_AVAILABLE: &str = "No disponible";

/// Display/aggregation-ready view of an invoice. Derived and disposable;
/// the [`RawInvoice`] remains the source of truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedInvoice {
    pub id: String,
    pub file: Option<String>,

    /// Raw identifiers, retained for filtering and cross-referencing.
    pub proyect_id: Option<String>,
    pub category_key: Option<String>,
    pub project_name: String,
    pub category_name: String,

    pub ruc: String,
    pub document_type: String,
    pub serie: String,
    pub correlativo: String,
    /// Extracted issue date, verbatim. Unparsable values pass through for
    /// display and are non-restrictive in range predicates.
    pub issue_date: String,
    pub supplier: String,
    pub address: String,
    pub currency: String,

    /// Currency-prefixed total, e.g. `"S/ 120"`, or the bare numeric string
    /// when no currency was extracted.
    pub total: String,
    /// Creation date in `DD/MM/YYYY` display form.
    pub date: String,

    pub status: Status,
    pub status_label: String,
    pub approved_by: Option<String>,
    pub rejected_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub collaborator: Option<String>,

    /// Parsed calendar dates backing the filter and aggregation engines.
    pub created_at: Option<NaiveDate>,
    pub updated_at: Option<NaiveDate>,
}

/// Normalize one raw invoice against the current reference snapshot.
pub fn normalize(raw: &RawInvoice, refs: &ReferenceMaps) -> NormalizedInvoice {
    let fields = raw.extracted();

    let proyect_id = raw.proyect.as_ref().map(|p| p.id().to_string());
    let category_key = raw.category.as_ref().map(|c| c.key().to_string());

    // Category: expanded name, then reference lookup, then a title-cased
    // key, then the placeholder.
    let category_name = raw
        .category
        .as_ref()
        .and_then(|c| c.name().map(str::to_string))
        .or_else(|| {
            category_key
                .as_deref()
                .and_then(|k| refs.category_name(k).map(str::to_string))
        })
        .or_else(|| category_key.as_deref().map(title_case))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    // Project: expanded name, then reference lookup, then the raw id itself.
    let project_name = raw
        .proyect
        .as_ref()
        .and_then(|p| p.name().map(str::to_string))
        .or_else(|| {
            proyect_id
                .as_deref()
                .and_then(|id| refs.project_name(id).map(str::to_string))
        })
        .or_else(|| proyect_id.clone())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    let currency = fields.moneda.clone().unwrap_or_default();
    let amount = fields
        .monto_total
        .as_ref()
        .map(Amount::display)
        .or_else(|| raw.total.as_ref().map(Amount::display));
    let total = match (&amount, currency.is_empty()) {
        (Some(a), false) => format!("{} {}", currency, a),
        (Some(a), true) => a.clone(),
        (None, _) => NOT_AVAILABLE.to_string(),
    };

    let created_at = raw.created_at.as_deref().and_then(dates::local_date);
    let updated_at = raw.updated_at.as_deref().and_then(dates::local_date);
    let date = created_at
        .map(dates::format_display)
        .or_else(|| raw.created_at.clone())
        .unwrap_or_default();

    NormalizedInvoice {
        id: raw.id.clone(),
        file: raw.file.clone(),
        proyect_id,
        category_key,
        project_name,
        category_name,
        ruc: present_or_placeholder(fields.ruc),
        document_type: present_or_placeholder(fields.tipo_documento),
        serie: present_or_placeholder(fields.serie),
        correlativo: present_or_placeholder(fields.correlativo),
        issue_date: present_or_placeholder(fields.fecha_emision),
        supplier: present_or_placeholder(fields.razon_social),
        address: present_or_placeholder(fields.direccion),
        currency,
        total,
        date,
        status: raw.status,
        status_label: raw.status.label().to_string(),
        approved_by: raw.approved_by.clone(),
        rejected_by: raw.rejected_by.clone(),
        rejection_reason: raw.rejection_reason.clone(),
        collaborator: fields.colaborador,
        created_at,
        updated_at,
    }
}

fn present_or_placeholder(value: Option<String>) -> String {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => NOT_AVAILABLE.to_string(),
    }
}

/// Title-case a raw category key: `"servicios_basicos"` → `"Servicios
/// Basicos"`.
fn title_case(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::refs::{Category, Project};

    fn refs() -> ReferenceMaps {
        ReferenceMaps::build(
            &[Project { id: "p-1".to_string(), name: "Obra Central".to_string() }],
            &[Category { key: "alimentacion".to_string(), name: "Alimentación".to_string() }],
        )
    }

    fn raw(json: &str) -> RawInvoice {
        serde_json::from_str(json).expect("test fixture")
    }

    #[test]
    fn test_currency_prefixed_total() {
        let inv = raw(
            r#"{"id":"f-1","data":"{\"montoTotal\":120,\"moneda\":\"S/\"}"}"#,
        );
        let n = normalize(&inv, &refs());
        assert_eq!(n.total, "S/ 120");
        assert_eq!(n.currency, "S/");
        assert_eq!(n.status_label, "Pendiente");
    }

    #[test]
    fn test_bare_total_without_currency() {
        let inv = raw(r#"{"id":"f-1","data":{"montoTotal":"85.50"}}"#);
        let n = normalize(&inv, &refs());
        assert_eq!(n.total, "85.50");
        assert_eq!(n.currency, "");
    }

    #[test]
    fn test_backend_total_is_fallback_only() {
        // Payload amount wins over the bare backend total.
        let inv = raw(r#"{"id":"f-1","total":999,"data":{"montoTotal":120}}"#);
        assert_eq!(normalize(&inv, &refs()).total, "120");

        let inv = raw(r#"{"id":"f-2","total":"45.00"}"#);
        assert_eq!(normalize(&inv, &refs()).total, "45.00");
    }

    #[test]
    fn test_malformed_data_yields_placeholders() {
        let inv = raw(r#"{"id":"f-1","data":"{{{"}"#);
        let n = normalize(&inv, &refs());
        assert_eq!(n.ruc, NOT_AVAILABLE);
        assert_eq!(n.document_type, NOT_AVAILABLE);
        assert_eq!(n.serie, NOT_AVAILABLE);
        assert_eq!(n.correlativo, NOT_AVAILABLE);
        assert_eq!(n.issue_date, NOT_AVAILABLE);
        assert_eq!(n.supplier, NOT_AVAILABLE);
        assert_eq!(n.address, NOT_AVAILABLE);
        assert_eq!(n.total, NOT_AVAILABLE);
    }

    #[test]
    fn test_reference_resolution_precedence() {
        // Expanded object name wins.
        let inv = raw(
            r#"{"id":"f-1","proyect":{"id":"p-1","name":"Nombre Expandido"},"category":{"key":"alimentacion","name":"Comidas"}}"#,
        );
        let n = normalize(&inv, &refs());
        assert_eq!(n.project_name, "Nombre Expandido");
        assert_eq!(n.category_name, "Comidas");

        // Bare ids resolve through the maps.
        let inv = raw(r#"{"id":"f-2","proyect":"p-1","category":"alimentacion"}"#);
        let n = normalize(&inv, &refs());
        assert_eq!(n.project_name, "Obra Central");
        assert_eq!(n.category_name, "Alimentación");

        // Unknown category key falls back to a title-cased key, unknown
        // project id to the id itself.
        let inv = raw(r#"{"id":"f-3","proyect":"p-9","category":"servicios_basicos"}"#);
        let n = normalize(&inv, &refs());
        assert_eq!(n.project_name, "p-9");
        assert_eq!(n.category_name, "Servicios Basicos");

        // Absent references get the placeholder.
        let inv = raw(r#"{"id":"f-4"}"#);
        let n = normalize(&inv, &refs());
        assert_eq!(n.project_name, NOT_AVAILABLE);
        assert_eq!(n.category_name, NOT_AVAILABLE);
    }

    #[test]
    fn test_created_at_display_format() {
        let inv = raw(r#"{"id":"f-1","createdAt":"2025-03-04T18:00:00Z"}"#);
        let n = normalize(&inv, &refs());
        assert_eq!(n.date, "04/03/2025");
        assert!(n.created_at.is_some());
    }

    #[test]
    fn test_unparsable_created_at_passes_through() {
        let inv = raw(r#"{"id":"f-1","createdAt":"hace poco"}"#);
        let n = normalize(&inv, &refs());
        assert_eq!(n.date, "hace poco");
        assert_eq!(n.created_at, None);
    }

    #[test]
    fn test_idempotence() {
        let inv = raw(
            r#"{"id":"f-1","proyect":"p-1","category":"alimentacion","status":"APPROVED","createdAt":"2025-03-04T18:00:00Z","data":"{\"montoTotal\":120,\"moneda\":\"S/\",\"ruc\":\"20100113612\"}"}"#,
        );
        let refs = refs();
        let first = normalize(&inv, &refs);
        let second = normalize(&inv, &refs);
        assert_eq!(first, second);
        assert_eq!(first.status, Status::Approved);
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("servicios_basicos"), "Servicios Basicos");
        assert_eq!(title_case("transporte"), "Transporte");
        assert_eq!(title_case("mano-de-obra"), "Mano De Obra");
    }
}
