//! Source adapter trait definitions.
//!
//! This module defines the core `PriceDataProvider` trait that every
//! price source adapter must implement.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::errors::PriceDataError;
use crate::models::PriceRow;

/// Which canonical symbol form a provider expects.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolForm {
    /// Plain instrument code, no market suffix (exchange feeds, licensed
    /// vendors keyed by local code).
    Bare,
    /// Ticker with market suffix, Yahoo conventions.
    YahooStyle,
}

/// Trait for daily price sources.
///
/// Implement this trait to plug a new data source into the proof
/// coordinator. The coordinator uses the provider's priority to decide
/// the waterfall order, and its symbol form to pick the right identifier
/// before calling [`fetch`](Self::fetch).
///
/// Per-provider quirks (field names, date formats, pagination) must be
/// normalized inside the adapter; only clean [`PriceRow`] values cross
/// this boundary.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use priceproof_market_data::provider::{PriceDataProvider, SymbolForm};
///
/// struct ExchangeFeed {
///     client: reqwest::Client,
/// }
///
/// #[async_trait]
/// impl PriceDataProvider for ExchangeFeed {
///     fn id(&self) -> &'static str {
///         "TWSE"
///     }
///
///     fn priority(&self) -> u8 {
///         5
///     }
///
///     async fn fetch(
///         &self,
///         symbol_id: &str,
///         from: NaiveDate,
///         to: NaiveDate,
///     ) -> Result<Vec<PriceRow>, PriceDataError> {
///         // ... call the upstream API, map its rows
///     }
/// }
/// ```
#[async_trait]
pub trait PriceDataProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// Should be a constant string like "TEJ", "TWSE", "YAHOO".
    /// Used for logging, circuit breaker tracking, and proof provenance.
    fn id(&self) -> &'static str;

    /// Provider priority for waterfall ordering.
    ///
    /// Lower values = higher trust, tried first. Default is 10.
    fn priority(&self) -> u8 {
        10
    }

    /// Whether this source's data is considered authoritative.
    ///
    /// External best-effort feeds should return false; the coordinator
    /// records an advisory warning when an untrusted source supplies the
    /// accepted row. Default is true.
    fn trusted(&self) -> bool {
        true
    }

    /// Which canonical symbol form this provider expects.
    ///
    /// Default is [`SymbolForm::Bare`].
    fn symbol_form(&self) -> SymbolForm {
        SymbolForm::Bare
    }

    /// Fetch daily rows for an instrument within `[from, to]`, inclusive.
    ///
    /// "No data for the window" is `Ok(vec![])`, never an error; typed
    /// errors are reserved for transport, auth, and rate-limit failures.
    /// Row ordering is unspecified; the coordinator selects by date.
    async fn fetch(
        &self,
        symbol_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<PriceRow>, PriceDataError>;
}
