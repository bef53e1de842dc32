//! Core data model for the price reliability layer.

mod price_row;
mod proof;
mod symbol;

pub use price_row::{latest_on_or_before, PriceRow};
pub use proof::{CrossCheckResult, PriceProof, NO_SOURCE};
pub use symbol::{forms, CanonicalSymbol, Exchange, Market};
