//! PriceProof Lifecycle Crate
//!
//! Adaptive cache-freshness (TTL) computation driven by per-tool lifecycle
//! classification.
//!
//! # Overview
//!
//! How long a cached tool answer stays usable depends on what kind of data
//! the tool serves: a realtime quote goes stale in minutes while the
//! session is open and is worthless the moment the next session opens; a
//! quarterly figure survives for days. This crate computes that lifetime:
//!
//! - [`ToolLifecycleDescriptor`] declares a tool's freshness policy
//! - [`LifecycleRegistry`] maps tool names to descriptors (injected, JSON-loaded)
//! - [`TtlCalculator`] turns a descriptor plus the current time into a TTL,
//!   aware of the market session and weekends, with seedable jitter
//!
//! The caller combines the computed TTL with its cache store's `set`; this
//! crate never touches the store itself.
//!
//! # Example
//!
//! ```
//! use chrono::Utc;
//! use priceproof_lifecycle::{LifecycleRegistry, TtlCalculator};
//!
//! let registry = LifecycleRegistry::from_json(
//!     r#"{
//!         "version": "1.0",
//!         "tools": [
//!             { "name": "stock_price", "lifecycle": "realtime",
//!               "after_hours_mode": "dynamic_until_open", "jitter_pct": 0 }
//!         ]
//!     }"#,
//! )
//! .unwrap();
//!
//! let calculator = TtlCalculator::new();
//! let ttl = calculator.ttl_for_tool(&registry, "stock_price", Utc::now());
//! assert!(ttl >= 1);
//! ```

pub mod calculator;
pub mod descriptor;
pub mod registry;

pub use calculator::{MarketSession, TtlCalculator};
pub use descriptor::{
    AfterHoursMode, ToolLifecycle, ToolLifecycleDescriptor, AFTER_HOURS_FIXED_TTL_S,
    DEFAULT_JITTER_PCT, DEFAULT_PERIODIC_TTL_S, DEFAULT_STATIC_TTL_S,
    DEFAULT_TRADING_HOURS_TTL_S, MIN_DYNAMIC_TTL_S,
};
pub use registry::{LifecycleRegistry, RegistryError};
