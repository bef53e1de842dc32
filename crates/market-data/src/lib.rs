//! PriceProof Market Data Crate
//!
//! Provider-agnostic price verification for mutually unreliable,
//! heterogeneously-formatted market data sources.
//!
//! # Overview
//!
//! This crate does not guarantee real-time market-data correctness - it
//! guarantees *process* correctness: deterministic source ordering,
//! documented fallback reasoning, and auditable cross-checks. It supports:
//! - Canonicalization of instrument identifiers across markets (Taiwan
//!   primary/OTC listings, US tickers)
//! - Waterfall fallback across prioritized sources with circuit breaking
//! - Nearest-prior-trading-day resolution for non-trading dates
//! - Advisory cross-source agreement checks
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+
//! |   Caller input   | --> | CanonicalSymbol  |  (normalized once)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |   Coordinator    |  (waterfall + breaker)
//!                          +------------------+
//!                                  |
//!                                  v
//!                         +-------------------+
//!                         | PriceDataProvider |  (TEJ, TWSE, Yahoo, ...)
//!                         +-------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |    PriceProof    |  (row + audit trail)
//!                          +------------------+
//! ```
//!
//! # Core Types
//!
//! - [`CanonicalSymbol`] - provider-agnostic instrument identity
//! - [`PriceRow`] - one daily OHLCV bar
//! - [`PriceProof`] - accepted row plus warnings and cross-checks
//! - [`PriceDataProvider`] - trait a source adapter implements
//! - [`PriceProofCoordinator`] - the waterfall orchestrator
//! - [`CircuitBreaker`] - per-provider failure isolation

pub mod coordinator;
pub mod errors;
pub mod models;
pub mod provider;
pub mod registry;
pub mod resolver;

// Re-export all public types from models
pub use models::{
    forms, latest_on_or_before, CanonicalSymbol, CrossCheckResult, Exchange, Market, PriceProof,
    PriceRow, NO_SOURCE,
};

// Re-export resolver entry point
pub use resolver::normalize;

// Re-export provider types
pub use provider::{PriceDataProvider, SymbolForm};

// Re-export registry types
pub use registry::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

// Re-export coordinator types
pub use coordinator::{CoordinatorConfig, PriceProofCoordinator};

// Re-export error types
pub use errors::{PriceDataError, RetryClass};
