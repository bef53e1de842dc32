//! Failure-isolation machinery shared by callers of flaky sources.

mod circuit_breaker;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
