//! Raw invoice records as the backend serves them.
//!
//! The backend is loose in three places and each is folded into one typed
//! shape here, never branched on downstream:
//! - `data` is either a JSON-encoded string or an already-parsed object;
//! - `category`/`proyect` are either bare identifiers or expanded records,
//!   depending on which endpoint produced the invoice;
//! - `status` arrives in either casing (`pending`/`PENDING`), folded into a
//!   canonical [`Status`] at deserialization, defaulting to pending.

use serde::{Deserialize, Deserializer, Serialize};

use crate::amount::Amount;
use crate::refs::{Category, Project};

/// Canonical approval state. Initial state is pending; approved and
/// rejected are terminal.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl Status {
    /// Case-insensitive parse of a backend status string.
    pub fn parse(s: &str) -> Option<Status> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Some(Status::Pending),
            "approved" => Some(Status::Approved),
            "rejected" => Some(Status::Rejected),
            _ => None,
        }
    }

    /// Wire form, always lowercase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::Approved => "approved",
            Status::Rejected => "rejected",
        }
    }

    /// User-facing label.
    pub fn label(&self) -> &'static str {
        match self {
            Status::Pending => "Pendiente",
            Status::Approved => "Aprobado",
            Status::Rejected => "Rechazado",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, Status::Pending)
    }
}

impl<'de> Deserialize<'de> for Status {
    // Fold casing exactly once, here. An unknown string degrades to pending
    // rather than failing a whole list response; the backend remains the
    // source of truth and the next reload corrects the view.
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Status::parse(&s).unwrap_or_default())
    }
}

/// Fields the analysis backend extracts from a document. Every field is
/// optional; OCR confidence is not guaranteed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExtractedFields {
    pub ruc: Option<String>,
    pub tipo_documento: Option<String>,
    pub serie: Option<String>,
    pub correlativo: Option<String>,
    pub fecha_emision: Option<String>,
    pub moneda: Option<String>,
    pub monto_total: Option<Amount>,
    pub razon_social: Option<String>,
    pub direccion: Option<String>,
    pub colaborador: Option<String>,
}

/// The `data` payload: parsed object or JSON-encoded string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawData {
    Parsed(ExtractedFields),
    Encoded(String),
}

impl RawData {
    /// Resolve to extracted fields. A malformed encoded payload degrades to
    /// an empty payload; extraction noise must never break rendering.
    pub fn fields(&self) -> ExtractedFields {
        match self {
            RawData::Parsed(fields) => fields.clone(),
            RawData::Encoded(text) => serde_json::from_str(text).unwrap_or_default(),
        }
    }
}

/// `proyect` as the backend spells it: bare id or expanded record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProyectField {
    Expanded(Project),
    Id(String),
}

impl ProyectField {
    pub fn id(&self) -> &str {
        match self {
            ProyectField::Expanded(p) => &p.id,
            ProyectField::Id(id) => id,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            ProyectField::Expanded(p) => Some(&p.name),
            ProyectField::Id(_) => None,
        }
    }
}

/// `category`: bare key or expanded record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryField {
    Expanded(Category),
    Key(String),
}

impl CategoryField {
    pub fn key(&self) -> &str {
        match self {
            CategoryField::Expanded(c) => &c.key,
            CategoryField::Key(key) => key,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            CategoryField::Expanded(c) => Some(&c.name),
            CategoryField::Key(_) => None,
        }
    }
}

/// An invoice record exactly as the backend returns it. Single source of
/// truth; mutated only through explicit update/approve/reject calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RawInvoice {
    pub id: String,
    /// Durable URL of the uploaded document.
    pub file: Option<String>,
    pub data: Option<RawData>,
    pub category: Option<CategoryField>,
    pub proyect: Option<ProyectField>,
    pub status: Status,
    pub status_date: Option<String>,
    pub approved_by: Option<String>,
    pub rejected_by: Option<String>,
    pub rejection_reason: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub total: Option<Amount>,
}

impl RawInvoice {
    /// Extracted payload with malformed data degraded to empty.
    pub fn extracted(&self) -> ExtractedFields {
        self.data.as_ref().map(RawData::fields).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_case_insensitive() {
        assert_eq!(Status::parse("PENDING"), Some(Status::Pending));
        assert_eq!(Status::parse("pending"), Some(Status::Pending));
        assert_eq!(Status::parse("Approved"), Some(Status::Approved));
        assert_eq!(Status::parse("REJECTED"), Some(Status::Rejected));
        assert_eq!(Status::parse("open"), None);
    }

    #[test]
    fn test_status_defaults_to_pending() {
        let inv: RawInvoice = serde_json::from_str(r#"{"id":"f-1"}"#).unwrap();
        assert_eq!(inv.status, Status::Pending);

        let inv: RawInvoice =
            serde_json::from_str(r#"{"id":"f-2","status":"APPROVED"}"#).unwrap();
        assert_eq!(inv.status, Status::Approved);
    }

    #[test]
    fn test_data_as_encoded_string() {
        let inv: RawInvoice = serde_json::from_str(
            r#"{"id":"f-1","data":"{\"montoTotal\":120,\"moneda\":\"S/\"}"}"#,
        )
        .unwrap();
        let fields = inv.extracted();
        assert_eq!(fields.monto_total, Some(Amount::Number(120.0)));
        assert_eq!(fields.moneda.as_deref(), Some("S/"));
    }

    #[test]
    fn test_data_as_object() {
        let inv: RawInvoice = serde_json::from_str(
            r#"{"id":"f-1","data":{"montoTotal":"85.50","ruc":"20100113612"}}"#,
        )
        .unwrap();
        let fields = inv.extracted();
        assert_eq!(fields.monto_total, Some(Amount::Text("85.50".to_string())));
        assert_eq!(fields.ruc.as_deref(), Some("20100113612"));
    }

    #[test]
    fn test_malformed_data_degrades_to_empty() {
        let inv: RawInvoice =
            serde_json::from_str(r#"{"id":"f-1","data":"{not json"}"#).unwrap();
        assert_eq!(inv.extracted(), ExtractedFields::default());
    }

    #[test]
    fn test_proyect_both_shapes() {
        let inv: RawInvoice = serde_json::from_str(
            r#"{"id":"f-1","proyect":{"id":"p-1","name":"Obra Central"}}"#,
        )
        .unwrap();
        let p = inv.proyect.unwrap();
        assert_eq!(p.id(), "p-1");
        assert_eq!(p.name(), Some("Obra Central"));

        let inv: RawInvoice =
            serde_json::from_str(r#"{"id":"f-2","proyect":"p-2"}"#).unwrap();
        let p = inv.proyect.unwrap();
        assert_eq!(p.id(), "p-2");
        assert_eq!(p.name(), None);
    }
}
