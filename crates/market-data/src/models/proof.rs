use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::price_row::PriceRow;
use super::symbol::CanonicalSymbol;

/// Source name recorded on a proof when no provider supplied a row.
pub const NO_SOURCE: &str = "none";

/// Outcome of comparing the accepted row against a secondary source.
///
/// Cross-checks are advisory provenance, never a veto: a mismatch is
/// recorded here but the accepted row is kept.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrossCheckResult {
    /// Whether the secondary close agreed within tolerance.
    #[serde(rename = "match")]
    pub matched: bool,

    /// Relative close difference, absent when the rows' dates disagreed
    /// or the secondary source had no row for the date.
    pub close_diff_pct: Option<f64>,

    /// Why the check failed, when it did.
    pub reason: Option<String>,

    /// The secondary source's row, when it produced one.
    pub compared_row: Option<PriceRow>,
}

/// The coordinator's output contract: a verified price together with the
/// audit trail explaining how it was obtained.
///
/// Invariants:
/// - `trade_date <= as_of_date` whenever `trade_date` is present
/// - `success` iff `row` is present
/// - `warnings` accumulates every non-fatal anomaly across all attempted
///   providers, in call order, and survives eventual success
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PriceProof {
    /// Whether a usable row was found.
    pub success: bool,

    /// Provider that supplied the accepted row, or [`NO_SOURCE`].
    pub source: String,

    /// The canonical identity the lookup ran against.
    pub symbol: CanonicalSymbol,

    /// The date the caller asked about.
    pub as_of_date: NaiveDate,

    /// The trading day of the accepted row.
    pub trade_date: Option<NaiveDate>,

    /// The accepted row.
    pub row: Option<PriceRow>,

    /// Non-fatal anomalies, in call order.
    pub warnings: Vec<String>,

    /// Advisory comparisons against secondary sources, keyed by provider.
    pub cross_checks: HashMap<String, CrossCheckResult>,

    /// True when the accepted row is not from the requested date.
    pub fallback_used: bool,
}

impl PriceProof {
    /// A fully-formed failure proof: inspectable, never an opaque error.
    pub fn failure(symbol: CanonicalSymbol, as_of_date: NaiveDate, warnings: Vec<String>) -> Self {
        Self {
            success: false,
            source: NO_SOURCE.to_string(),
            symbol,
            as_of_date,
            trade_date: None,
            row: None,
            warnings,
            cross_checks: HashMap::new(),
            fallback_used: false,
        }
    }
}
