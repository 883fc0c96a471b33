//! Report aggregation over a filtered, normalized collection.
//!
//! Two shapes: scalar totals per group (pie-chart use, zero-sum groups
//! pruned) and per-month totals per group (time-series use, every month in
//! the requested range present so the x-axis stays contiguous).

use chrono::{Datelike, NaiveDate};
use std::collections::{BTreeMap, HashMap};

use crate::amount::parse_amount;
use crate::dates;
use crate::normalize::NormalizedInvoice;

/// Numeric total of an invoice for aggregation; an unparsable total
/// contributes zero, matching the filter engine's sanitized parse.
pub fn invoice_amount(invoice: &NormalizedInvoice) -> f64 {
    parse_amount(&invoice.total).unwrap_or(0.0)
}

/// Grouping key: project.
pub fn project_key(invoice: &NormalizedInvoice) -> String {
    invoice
        .proyect_id
        .clone()
        .unwrap_or_else(|| invoice.project_name.clone())
}

/// Grouping key: category.
pub fn category_key(invoice: &NormalizedInvoice) -> String {
    invoice
        .category_key
        .clone()
        .unwrap_or_else(|| invoice.category_name.clone())
}

/// Grouping key: collaborator. Extraction does not always yield a
/// submitter identity, so this degrades to the project id and finally to a
/// literal unknown bucket.
pub fn collaborator_key(invoice: &NormalizedInvoice) -> String {
    invoice
        .collaborator
        .clone()
        .or_else(|| invoice.proyect_id.clone())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Sum totals per group. Groups whose sum is exactly zero are dropped:
/// a zero slice is not shown.
pub fn totals_by_group<F>(invoices: &[NormalizedInvoice], key: F) -> HashMap<String, f64>
where
    F: Fn(&NormalizedInvoice) -> String,
{
    let mut totals: HashMap<String, f64> = HashMap::new();
    for invoice in invoices {
        *totals.entry(key(invoice)).or_insert(0.0) += invoice_amount(invoice);
    }
    totals.retain(|_, sum| *sum != 0.0);
    totals
}

/// Calendar months (`YYYY-MM`, ascending) covered by the active filter
/// bounds, truncated to months, inclusive. A missing bound falls back to
/// the earliest/latest update month observed in the collection.
pub fn month_range(
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    invoices: &[NormalizedInvoice],
) -> Vec<String> {
    let observed_min = invoices.iter().filter_map(|i| i.updated_at).min();
    let observed_max = invoices.iter().filter_map(|i| i.updated_at).max();

    let (Some(start), Some(end)) = (from.or(observed_min), to.or(observed_max)) else {
        return Vec::new();
    };

    let mut months = Vec::new();
    let (mut year, mut month) = (start.year(), start.month());
    let (end_year, end_month) = (end.year(), end.month());
    while (year, month) <= (end_year, end_month) {
        months.push(format!("{:04}-{:02}", year, month));
        if month == 12 {
            year += 1;
            month = 1;
        } else {
            month += 1;
        }
    }
    months
}

/// Per-month totals per group. Every requested month is initialized to
/// zero for every group discovered in the collection; an invoice
/// accumulates into its own update month only when that month is in range.
pub fn time_series_by_group<F>(
    invoices: &[NormalizedInvoice],
    key: F,
    months: &[String],
) -> BTreeMap<String, BTreeMap<String, f64>>
where
    F: Fn(&NormalizedInvoice) -> String,
{
    let empty_row = || -> BTreeMap<String, f64> {
        months.iter().map(|m| (m.clone(), 0.0)).collect()
    };

    let mut series: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
    for invoice in invoices {
        let row = series.entry(key(invoice)).or_insert_with(empty_row);
        let Some(updated) = invoice.updated_at else {
            continue;
        };
        let bucket = dates::month_key(updated);
        if let Some(total) = row.get_mut(&bucket) {
            *total += invoice_amount(invoice);
        }
    }
    series
}
