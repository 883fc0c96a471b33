//! Date conversions across the pipeline's three formats.
//!
//! User-facing dates render as `DD/MM/YYYY`. One legacy list endpoint takes
//! `DD-MM-YYYY` query params; form/update payloads use ISO `YYYY-MM-DD`.
//! The dual wire format is a compatibility shim and is preserved exactly.

use chrono::{DateTime, NaiveDate};
use chrono_tz::America::Lima;

const DISPLAY_FMT: &str = "%d/%m/%Y";
const LEGACY_FMT: &str = "%d-%m-%Y";
const ISO_FMT: &str = "%Y-%m-%d";

pub fn format_display(date: NaiveDate) -> String {
    date.format(DISPLAY_FMT).to_string()
}

pub fn parse_display(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DISPLAY_FMT).ok()
}

pub fn format_legacy(date: NaiveDate) -> String {
    date.format(LEGACY_FMT).to_string()
}

pub fn parse_legacy(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), LEGACY_FMT).ok()
}

pub fn format_iso(date: NaiveDate) -> String {
    date.format(ISO_FMT).to_string()
}

pub fn parse_iso(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), ISO_FMT).ok()
}

/// Parse a date in whichever of the three formats it happens to be in.
/// Extraction payloads are not guaranteed to use any one of them.
pub fn parse_flexible(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    parse_iso(s)
        .or_else(|| parse_display(s))
        .or_else(|| parse_legacy(s))
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.with_timezone(&Lima).date_naive()))
}

/// Local calendar date (America/Lima) of an RFC 3339 timestamp such as the
/// backend's `createdAt`/`updatedAt`.
pub fn local_date(timestamp: &str) -> Option<NaiveDate> {
    DateTime::parse_from_rfc3339(timestamp.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Lima).date_naive())
        .or_else(|| parse_flexible(timestamp))
}

/// Re-encode a display or extraction date for an ISO form payload. An
/// unparsable input passes through verbatim; range predicates elsewhere
/// treat the same input as non-restrictive.
pub fn to_iso_or_verbatim(s: &str) -> String {
    match parse_flexible(s) {
        Some(d) => format_iso(d),
        None => s.to_string(),
    }
}

/// `YYYY-MM` bucket key for time-series aggregation.
pub fn month_key(date: NaiveDate) -> String {
    date.format("%Y-%m").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_round_trip() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 4).unwrap();
        assert_eq!(format_display(d), "04/03/2025");
        assert_eq!(parse_display("04/03/2025"), Some(d));
    }

    #[test]
    fn test_legacy_and_iso_differ() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(format_legacy(d), "31-12-2025");
        assert_eq!(format_iso(d), "2025-12-31");
        assert_eq!(parse_legacy("31-12-2025"), Some(d));
        assert_eq!(parse_iso("2025-12-31"), Some(d));
    }

    #[test]
    fn test_parse_flexible_accepts_all_three() {
        let d = NaiveDate::from_ymd_opt(2025, 7, 9).unwrap();
        assert_eq!(parse_flexible("2025-07-09"), Some(d));
        assert_eq!(parse_flexible("09/07/2025"), Some(d));
        assert_eq!(parse_flexible("09-07-2025"), Some(d));
        assert_eq!(parse_flexible("not a date"), None);
    }

    #[test]
    fn test_local_date_shifts_to_lima() {
        // 03:00 UTC is still the previous day in Lima (UTC-5).
        assert_eq!(
            local_date("2025-03-05T03:00:00Z"),
            NaiveDate::from_ymd_opt(2025, 3, 4)
        );
    }

    #[test]
    fn test_iso_or_verbatim_passthrough() {
        assert_eq!(to_iso_or_verbatim("04/03/2025"), "2025-03-04");
        assert_eq!(to_iso_or_verbatim("??"), "??");
    }

    #[test]
    fn test_month_key() {
        let d = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        assert_eq!(month_key(d), "2025-02");
    }
}
