use failsafe::{backoff, failure_policy, Config, StateMachine};
use std::time::Duration;

/// Breaker type shared by every Graph API call made by one client.
pub type GraphCircuitBreaker =
    StateMachine<failure_policy::ConsecutiveFailures<backoff::Exponential>, ()>;

/// Creates a circuit breaker for Graph API calls.
///
/// # Configuration
///
/// - **Failure threshold**: 5 consecutive failures trips the breaker.
/// - **Backoff**: exponential from 10s to 60s before a trial call is let through.
///
/// While open, calls fail fast with `failsafe::Error::Rejected` instead of
/// reaching Facebook.
pub fn create_graph_circuit_breaker() -> GraphCircuitBreaker {
    let backoff_strategy = backoff::exponential(Duration::from_secs(10), Duration::from_secs(60));

    let failure_policy = failure_policy::consecutive_failures(5, backoff_strategy);

    Config::new().failure_policy(failure_policy).build()
}
