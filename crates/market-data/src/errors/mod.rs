//! Error types and retry classification for the price data crate.
//!
//! This module provides:
//! - [`PriceDataError`]: The main error enum for all price data operations
//! - [`RetryClass`]: Classification that makes the coordinator's
//!   catch-and-continue waterfall behavior explicit in the type system

mod retry;

pub use retry::RetryClass;

use thiserror::Error;

/// Errors that can occur while fetching or verifying price data.
///
/// Each variant is classified into a [`RetryClass`] via the
/// [`retry_class`](Self::retry_class) method, which determines how the
/// coordinator's waterfall handles the error. Only [`InvalidInput`]
/// (malformed request parameters) is ever returned to a caller of the
/// coordinator; every other variant is absorbed into the proof's warnings.
///
/// [`InvalidInput`]: Self::InvalidInput
#[derive(Error, Debug)]
pub enum PriceDataError {
    /// The request parameters were malformed (e.g. an empty symbol).
    /// Rejected synchronously before any provider is called.
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of what was wrong with the input
        message: String,
    },

    /// The provider does not know the requested symbol.
    /// Another provider may still recognize it.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The provider is reachable but refused or failed the request.
    #[error("Provider unavailable: {provider} - {message}")]
    ProviderUnavailable {
        /// The provider that failed
        provider: String,
        /// The failure description from the provider
        message: String,
    },

    /// The provider rate limited the request (HTTP 429).
    #[error("Rate limited: {provider}")]
    RateLimited {
        /// The provider that rate limited the request
        provider: String,
    },

    /// The request to the provider timed out.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The provider rejected our credentials.
    #[error("Authentication failed: {provider}")]
    AuthFailed {
        /// The provider that rejected the credentials
        provider: String,
    },

    /// The circuit breaker is open for this provider.
    /// Skip it until the circuit closes.
    #[error("Circuit open: {provider}")]
    CircuitOpen {
        /// The provider with an open circuit
        provider: String,
    },

    /// Every configured source was tried and none produced a usable row.
    #[error("All sources exhausted")]
    AllSourcesExhausted,

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl PriceDataError {
    /// Returns the retry classification for this error.
    ///
    /// # Examples
    ///
    /// ```
    /// use priceproof_market_data::errors::{PriceDataError, RetryClass};
    ///
    /// let error = PriceDataError::RateLimited { provider: "YAHOO".to_string() };
    /// assert_eq!(error.retry_class(), RetryClass::FailoverWithPenalty);
    ///
    /// let error = PriceDataError::SymbolNotFound("??".to_string());
    /// assert_eq!(error.retry_class(), RetryClass::NextProvider);
    /// ```
    pub fn retry_class(&self) -> RetryClass {
        match self {
            // Bad input or exhausted options - surfaced, never recovered
            Self::InvalidInput { .. } | Self::AllSourcesExhausted => RetryClass::Never,

            // Transport failures - failover and penalize the provider
            Self::ProviderUnavailable { .. }
            | Self::RateLimited { .. }
            | Self::Timeout { .. }
            | Self::AuthFailed { .. }
            | Self::Network(_) => RetryClass::FailoverWithPenalty,

            // This provider can't answer, others might
            Self::SymbolNotFound(_) => RetryClass::NextProvider,

            // Circuit breaker open
            Self::CircuitOpen { .. } => RetryClass::CircuitOpen,
        }
    }
}
