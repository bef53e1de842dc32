//! Per-provider circuit breaker for fault tolerance.
//!
//! Implements the circuit breaker pattern to prevent cascading failures
//! when a provider is experiencing issues. The circuit has three states:
//!
//! - **Closed**: Normal operation, requests are allowed through.
//! - **Open**: Provider is failing, requests are blocked.
//! - **HalfOpen**: One trial request is in flight to test recovery.
//!
//! The circuit breaker is in-memory and resets on application restart.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

/// Default number of consecutive failures before opening the circuit.
const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default time to wait before transitioning from Open to HalfOpen.
const DEFAULT_RESET_TIMEOUT: Duration = Duration::from_secs(30);

/// Circuit breaker state.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CircuitState {
    /// Normal operation - requests are allowed.
    Closed,
    /// Provider is failing - requests are blocked.
    Open,
    /// A single trial request has been permitted; awaiting its outcome.
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Internal circuit state for a single provider.
#[derive(Debug)]
struct Circuit {
    state: CircuitState,
    consecutive_failures: u32,
    opened_at: Option<Instant>,
}

impl Circuit {
    fn new() -> Self {
        Self {
            state: CircuitState::Closed,
            consecutive_failures: 0,
            opened_at: None,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before opening the circuit.
    pub failure_threshold: u32,
    /// Time to wait before permitting a trial request.
    pub reset_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            reset_timeout: DEFAULT_RESET_TIMEOUT,
        }
    }
}

/// Per-provider circuit breaker.
///
/// Thread-safe: one instance is shared by every caller of a provider.
/// The breaker never calls the guarded function itself - callers must
/// check [`is_allowed`](Self::is_allowed) before the call and report the
/// outcome with [`record_success`](Self::record_success) /
/// [`record_failure`](Self::record_failure) afterwards.
///
/// While open, `is_allowed` returns false until the reset timeout has
/// elapsed; it then returns true exactly once (entering half-open) and
/// false again until the trial call is resolved.
pub struct CircuitBreaker {
    circuits: Mutex<HashMap<String, Circuit>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with default settings.
    pub fn new() -> Self {
        Self::with_config(CircuitBreakerConfig::default())
    }

    /// Create a circuit breaker with custom configuration.
    pub fn with_config(config: CircuitBreakerConfig) -> Self {
        Self {
            circuits: Mutex::new(HashMap::new()),
            config,
        }
    }

    /// Lock the circuits mutex, recovering from poison if necessary.
    ///
    /// Recovering from a poisoned mutex is safe here: the worst case is a
    /// slightly stale circuit state, which beats panicking in the middle
    /// of a waterfall.
    fn lock_circuits(&self) -> MutexGuard<'_, HashMap<String, Circuit>> {
        self.circuits.lock().unwrap_or_else(|poisoned| {
            warn!("Circuit breaker mutex was poisoned, recovering");
            poisoned.into_inner()
        })
    }

    /// Check if a request to this provider is allowed.
    ///
    /// Handles the Open -> HalfOpen transition once the reset timeout has
    /// elapsed, permitting exactly one trial call.
    pub fn is_allowed(&self, provider: &str) -> bool {
        let mut circuits = self.lock_circuits();

        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new);

        match circuit.state {
            CircuitState::Closed => true,
            CircuitState::HalfOpen => {
                // Trial call already out - block until it resolves
                false
            }
            CircuitState::Open => {
                let elapsed = circuit.opened_at.map(|t| t.elapsed());
                if elapsed.is_some_and(|e| e >= self.config.reset_timeout) {
                    info!(
                        "Circuit breaker: transitioning '{}' from Open to HalfOpen",
                        provider
                    );
                    circuit.state = CircuitState::HalfOpen;
                    return true;
                }
                false
            }
        }
    }

    /// Record a successful request for a provider.
    ///
    /// Any success closes the circuit and resets the failure count.
    pub fn record_success(&self, provider: &str) {
        let mut circuits = self.lock_circuits();

        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new);

        if circuit.state != CircuitState::Closed {
            info!(
                "Circuit breaker: closing circuit for '{}' after success in {}",
                provider, circuit.state
            );
        } else {
            debug!(
                "Circuit breaker: success for '{}', failure count reset",
                provider
            );
        }

        circuit.state = CircuitState::Closed;
        circuit.consecutive_failures = 0;
        circuit.opened_at = None;
    }

    /// Record a failed request for a provider.
    ///
    /// Increments the failure count and may open the circuit. In HalfOpen,
    /// the failed trial immediately reopens the circuit and restarts the
    /// reset timeout.
    pub fn record_failure(&self, provider: &str) {
        let mut circuits = self.lock_circuits();

        let circuit = circuits
            .entry(provider.to_string())
            .or_insert_with(Circuit::new);

        circuit.consecutive_failures += 1;

        match circuit.state {
            CircuitState::Closed => {
                if circuit.consecutive_failures >= self.config.failure_threshold {
                    info!(
                        "Circuit breaker: opening circuit for '{}' after {} failures",
                        provider, circuit.consecutive_failures
                    );
                    circuit.state = CircuitState::Open;
                    circuit.opened_at = Some(Instant::now());
                } else {
                    debug!(
                        "Circuit breaker: failure for '{}' ({}/{})",
                        provider, circuit.consecutive_failures, self.config.failure_threshold
                    );
                }
            }
            CircuitState::HalfOpen => {
                info!(
                    "Circuit breaker: reopening circuit for '{}' after failed trial",
                    provider
                );
                circuit.state = CircuitState::Open;
                circuit.opened_at = Some(Instant::now());
            }
            CircuitState::Open => {
                // Stray failure report (e.g. from a cross-check call);
                // keep the circuit open and restart the timeout
                circuit.opened_at = Some(Instant::now());
            }
        }
    }

    /// Get the current state for a provider.
    pub fn state(&self, provider: &str) -> CircuitState {
        let circuits = self.lock_circuits();

        circuits
            .get(provider)
            .map(|c| c.state)
            .unwrap_or(CircuitState::Closed)
    }

    /// Get the consecutive failure count for a provider.
    pub fn failure_count(&self, provider: &str) -> u32 {
        let circuits = self.lock_circuits();

        circuits
            .get(provider)
            .map(|c| c.consecutive_failures)
            .unwrap_or(0)
    }

    /// Reset the circuit for a provider to Closed state.
    pub fn reset(&self, provider: &str) {
        let mut circuits = self.lock_circuits();

        if let Some(circuit) = circuits.get_mut(provider) {
            info!(
                "Circuit breaker: manually resetting circuit for '{}'",
                provider
            );
            circuit.state = CircuitState::Closed;
            circuit.consecutive_failures = 0;
            circuit.opened_at = None;
        }
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new()
    }
}
