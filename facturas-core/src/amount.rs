//! Money values as they cross the backend boundary.
//!
//! The backend is inconsistent: `total` and `montoTotal` arrive either as a
//! JSON number or as a numeric string. Both shapes collapse into [`Amount`]
//! once, at deserialization, so downstream code never branches on it again.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static NON_NUMERIC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[^0-9.]").expect("static pattern")
});

/// A backend amount: number or numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Number(f64),
    Text(String),
}

impl Amount {
    /// Numeric value, if one can be read out of this amount.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Amount::Number(n) => Some(*n),
            Amount::Text(s) => parse_amount(s),
        }
    }

    /// Display form: strings pass through verbatim, numbers drop a trailing
    /// `.0` so `120.0` renders as `120`.
    pub fn display(&self) -> String {
        match self {
            Amount::Number(n) => format_number(*n),
            Amount::Text(s) => s.clone(),
        }
    }
}

/// Format a number minimally: integers without decimals, otherwise as-is.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Parse a numeric value out of a formatted amount like `"S/ 1250.50"` by
/// stripping everything that is not a digit or a dot. Returns `None` when
/// nothing numeric remains.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned = NON_NUMERIC.replace_all(text, "");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}
