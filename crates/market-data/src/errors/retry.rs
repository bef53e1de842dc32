/// Classification for waterfall policy.
///
/// Used to determine how the coordinator should respond to errors from
/// source adapters.
///
/// # Behavior Summary
///
/// | Class | Try Next Provider? | Record Circuit Breaker Failure? |
/// |-------|-------------------|--------------------------------|
/// | `Never` | No | No |
/// | `FailoverWithPenalty` | Yes | Yes (affects future requests) |
/// | `NextProvider` | Yes | No |
/// | `CircuitOpen` | Yes (skip this one) | No (already recorded) |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// Never continue - the request itself is invalid or all options are
    /// already exhausted. Surfaced to the caller.
    Never,

    /// Failover to the next provider and record a circuit breaker penalty.
    ///
    /// Used for transport-level failures: rate limiting (429), timeout,
    /// auth rejection, network errors. The failure accumulates in the
    /// circuit breaker, which may cause this provider to be skipped
    /// entirely once failures pile up.
    FailoverWithPenalty,

    /// Try the next provider without recording any penalty.
    ///
    /// Used when this provider can't answer this particular request
    /// (symbol unknown to it, no rows for the window) but is otherwise
    /// healthy and another provider might succeed.
    NextProvider,

    /// Circuit breaker is open for this provider.
    /// Skip it until the circuit closes.
    CircuitOpen,
}
