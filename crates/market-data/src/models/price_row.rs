use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One daily OHLCV bar as produced by a source adapter.
///
/// Rows are compared, never mutated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRow {
    /// The trading day this bar covers.
    pub trade_date: NaiveDate,

    /// Opening price
    pub open: Decimal,

    /// High price
    pub high: Decimal,

    /// Low price
    pub low: Decimal,

    /// Closing price
    pub close: Decimal,

    /// Trading volume (shares/units)
    pub volume: u64,
}

/// Select the row with the latest `trade_date` that is on or before `as_of`.
///
/// Rows outside the bound are ignored; ties cannot occur for daily bars.
pub fn latest_on_or_before(rows: &[PriceRow], as_of: NaiveDate) -> Option<&PriceRow> {
    rows.iter()
        .filter(|row| row.trade_date <= as_of)
        .max_by_key(|row| row.trade_date)
}
