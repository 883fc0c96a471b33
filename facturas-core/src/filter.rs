//! Multi-dimensional invoice filtering.
//!
//! A [`Filter`] is an immutable value object; every set field must match
//! (conjunction) and an unset field is vacuously true. Unparsable dates or
//! amounts on the invoice side make the corresponding bound non-restrictive
//! rather than failing the predicate.

use chrono::NaiveDate;

use crate::amount::parse_amount;
use crate::dates;
use crate::invoice::Status;
use crate::normalize::NormalizedInvoice;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pub proyect: Option<String>,
    pub category: Option<String>,
    pub status: Option<Status>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proyect(mut self, proyect: impl Into<String>) -> Self {
        self.proyect = Some(proyect.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_date_from(mut self, from: NaiveDate) -> Self {
        self.date_from = Some(from);
        self
    }

    pub fn with_date_to(mut self, to: NaiveDate) -> Self {
        self.date_to = Some(to);
        self
    }

    pub fn with_amount_min(mut self, min: f64) -> Self {
        self.amount_min = Some(min);
        self
    }

    pub fn with_amount_max(mut self, max: f64) -> Self {
        self.amount_max = Some(max);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Filter::default()
    }
}

/// Conjunctive predicate over one normalized invoice.
pub fn matches(invoice: &NormalizedInvoice, filter: &Filter) -> bool {
    if let Some(p) = &filter.proyect {
        let by_id = invoice.proyect_id.as_deref() == Some(p.as_str());
        if !by_id && invoice.project_name != *p {
            return false;
        }
    }

    if let Some(c) = &filter.category {
        let by_key = invoice.category_key.as_deref() == Some(c.as_str());
        if !by_key && invoice.category_name != *c {
            return false;
        }
    }

    if let Some(s) = filter.status {
        if invoice.status != s {
            return false;
        }
    }

    if filter.date_from.is_some() || filter.date_to.is_some() {
        // The created date is read back from its display form; an
        // unparsable date leaves the range unconstrained.
        if let Some(date) = dates::parse_display(&invoice.date) {
            if let Some(from) = filter.date_from {
                if date < from {
                    return false;
                }
            }
            if let Some(to) = filter.date_to {
                if date > to {
                    return false;
                }
            }
        }
    }

    if filter.amount_min.is_some() || filter.amount_max.is_some() {
        if let Some(amount) = parse_amount(&invoice.total) {
            if let Some(min) = filter.amount_min {
                if amount < min {
                    return false;
                }
            }
            if let Some(max) = filter.amount_max {
                if amount > max {
                    return false;
                }
            }
        }
    }

    true
}

/// Apply a filter over a normalized collection.
pub fn apply<'a>(
    invoices: &'a [NormalizedInvoice],
    filter: &Filter,
) -> Vec<&'a NormalizedInvoice> {
    invoices.iter().filter(|inv| matches(inv, filter)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::RawInvoice;
    use crate::normalize::normalize;
    use crate::refs::ReferenceMaps;

    fn invoice(json: &str) -> NormalizedInvoice {
        let raw: RawInvoice = serde_json::from_str(json).expect("test fixture");
        normalize(&raw, &ReferenceMaps::default())
    }

    #[test]
    fn test_empty_filter_matches_everything() {
        let inv = invoice(r#"{"id":"f-1"}"#);
        assert!(matches(&inv, &Filter::new()));
        assert!(Filter::new().is_empty());
    }

    #[test]
    fn test_amount_range_inclusive() {
        let totals = ["S/ 50", "S/ 150", "S/ 300"];
        let invoices: Vec<_> = totals
            .iter()
            .enumerate()
            .map(|(i, t)| {
                invoice(&format!(
                    r#"{{"id":"f-{}","data":{{"montoTotal":"{}","moneda":"S/"}}}}"#,
                    i,
                    t.trim_start_matches("S/ ")
                ))
            })
            .collect();

        let filter = Filter::new().with_amount_min(100.0).with_amount_max(200.0);
        let hits = apply(&invoices, &filter);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].total, "S/ 150");

        // Bounds are inclusive.
        let filter = Filter::new().with_amount_min(150.0).with_amount_max(150.0);
        assert_eq!(apply(&invoices, &filter).len(), 1);
    }

    #[test]
    fn test_unparsable_amount_is_unconstrained() {
        let inv = invoice(r#"{"id":"f-1"}"#);
        assert_eq!(inv.total, "No disponible");
        let filter = Filter::new().with_amount_min(100.0);
        assert!(matches(&inv, &filter));
    }

    #[test]
    fn test_date_range() {
        let inv = invoice(r#"{"id":"f-1","createdAt":"2025-03-15T12:00:00Z"}"#);
        let mar_1 = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mar_15 = NaiveDate::from_ymd_opt(2025, 3, 15).unwrap();
        let mar_31 = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();

        assert!(matches(&inv, &Filter::new().with_date_from(mar_1).with_date_to(mar_31)));
        // Inclusive on both ends.
        assert!(matches(&inv, &Filter::new().with_date_from(mar_15).with_date_to(mar_15)));
        assert!(!matches(&inv, &Filter::new().with_date_to(mar_1)));
        assert!(!matches(&inv, &Filter::new().with_date_from(mar_31)));
    }

    #[test]
    fn test_unparsable_date_is_unconstrained() {
        let inv = invoice(r#"{"id":"f-1","createdAt":"ayer"}"#);
        let filter = Filter::new()
            .with_date_from(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
        assert!(matches(&inv, &filter));
    }

    #[test]
    fn test_project_matches_key_or_display_name() {
        let raw: RawInvoice =
            serde_json::from_str(r#"{"id":"f-1","proyect":{"id":"p-1","name":"Obra Central"}}"#)
                .unwrap();
        let inv = normalize(&raw, &ReferenceMaps::default());

        assert!(matches(&inv, &Filter::new().with_proyect("p-1")));
        assert!(matches(&inv, &Filter::new().with_proyect("Obra Central")));
        assert!(!matches(&inv, &Filter::new().with_proyect("p-2")));
    }

    #[test]
    fn test_status_and_conjunction() {
        let inv = invoice(
            r#"{"id":"f-1","status":"APPROVED","data":{"montoTotal":200,"moneda":"S/"}}"#,
        );
        assert!(matches(&inv, &Filter::new().with_status(Status::Approved)));
        assert!(!matches(&inv, &Filter::new().with_status(Status::Pending)));
        // Every set dimension must hold.
        let filter = Filter::new()
            .with_status(Status::Approved)
            .with_amount_max(100.0);
        assert!(!matches(&inv, &filter));
    }
}
