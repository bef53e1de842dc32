//! Source adapter abstractions.
//!
//! This module contains the `PriceDataProvider` trait that all price
//! sources implement. Concrete adapters (licensed vendor clients, exchange
//! feeds, public tickers) live in their own crates and are injected into
//! the coordinator; the reliability layer never talks HTTP itself.
//!
//! The provider system is designed to be:
//! - **Provider-agnostic**: the coordinator doesn't know about specific feeds
//! - **Extensible**: new sources are added by implementing `PriceDataProvider`
//! - **Resilient**: a circuit breaker isolates persistently failing sources

mod traits;

pub use traits::{PriceDataProvider, SymbolForm};
