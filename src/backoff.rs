//! Consecutive-failure circuit breaker guarding silent-auth calls.
//!
//! The policy is a two-state machine. While **closed** every call is permitted and each failure
//! bumps the counter. Once the counter reaches the threshold the policy is **open**: calls are
//! short-circuited until the reset window has passed since the last failure, after which the
//! counter drops back to zero and a call is let through. A success always resets the counter.
//!
//! Every decision takes `now` explicitly so the machine can be driven without a real clock.

// self
use crate::_prelude::*;

/// Failures tolerated before the circuit opens.
pub const DEFAULT_MAX_FAILURES: u32 = 3;
/// Cooldown measured from the most recent failure.
pub const DEFAULT_RESET_WINDOW: Duration = Duration::seconds(10);

/// Observable state of the breaker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
	/// Calls are permitted.
	Closed,
	/// Calls are short-circuited until the reset window elapses.
	Open,
}

/// Verdict returned by [`ErrorBackoffPolicy::permit`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackoffDecision {
	/// The provider may be contacted.
	Permit,
	/// The provider must not be contacted yet.
	ShortCircuit {
		/// Time left until the reset window elapses.
		retry_in: Duration,
	},
}

/// Point-in-time view of the policy, for logs and diagnostics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffSnapshot {
	/// Current breaker state.
	pub state: CircuitState,
	/// Consecutive failures since the last reset.
	pub failure_count: u32,
	/// Instant of the most recent failure.
	pub last_failure_at: Option<OffsetDateTime>,
}

/// Tracks consecutive provider failures and decides whether the next call may proceed.
#[derive(Clone, Debug)]
pub struct ErrorBackoffPolicy {
	max_failures: u32,
	reset_window: Duration,
	failure_count: u32,
	last_failure_at: Option<OffsetDateTime>,
}
impl ErrorBackoffPolicy {
	/// Creates a closed policy with the provided threshold and cooldown.
	///
	/// A zero threshold is treated as one so the circuit can still open.
	pub fn new(max_failures: u32, reset_window: Duration) -> Self {
		Self { max_failures: max_failures.max(1), reset_window, failure_count: 0, last_failure_at: None }
	}

	/// Returns the current breaker state.
	pub fn state(&self) -> CircuitState {
		if self.failure_count >= self.max_failures { CircuitState::Open } else { CircuitState::Closed }
	}

	/// Consecutive failures since the last reset.
	pub fn failure_count(&self) -> u32 {
		self.failure_count
	}

	/// Instant of the most recent failure.
	pub fn last_failure_at(&self) -> Option<OffsetDateTime> {
		self.last_failure_at
	}

	/// Captures the current state.
	pub fn snapshot(&self) -> BackoffSnapshot {
		BackoffSnapshot {
			state: self.state(),
			failure_count: self.failure_count,
			last_failure_at: self.last_failure_at,
		}
	}

	/// Decides whether a call issued at `now` may reach the provider.
	///
	/// When the circuit is open and the reset window has elapsed, the counter is reset and the
	/// call is permitted.
	pub fn permit(&mut self, now: OffsetDateTime) -> BackoffDecision {
		if self.state() == CircuitState::Closed {
			return BackoffDecision::Permit;
		}

		let elapsed = self.last_failure_at.map(|last| now - last).unwrap_or(self.reset_window);

		if elapsed < self.reset_window {
			return BackoffDecision::ShortCircuit { retry_in: self.reset_window - elapsed };
		}

		self.failure_count = 0;

		BackoffDecision::Permit
	}

	/// Records a successful acquisition.
	pub fn record_success(&mut self) {
		self.failure_count = 0;
		self.last_failure_at = None;
	}

	/// Records a failed acquisition observed at `now`.
	pub fn record_failure(&mut self, now: OffsetDateTime) {
		self.failure_count = self.failure_count.saturating_add(1);
		self.last_failure_at = Some(now);
	}
}
impl Default for ErrorBackoffPolicy {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_FAILURES, DEFAULT_RESET_WINDOW)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	const T0: OffsetDateTime = datetime!(2025-06-01 12:00 UTC);

	fn fail_n(policy: &mut ErrorBackoffPolicy, n: u32, at: OffsetDateTime) {
		for _ in 0..n {
			assert_eq!(policy.permit(at), BackoffDecision::Permit);

			policy.record_failure(at);
		}
	}

	#[test]
	fn opens_after_threshold_and_short_circuits_inside_window() {
		let mut policy = ErrorBackoffPolicy::default();

		fail_n(&mut policy, DEFAULT_MAX_FAILURES, T0);

		assert_eq!(policy.state(), CircuitState::Open);
		assert_eq!(
			policy.permit(T0 + Duration::seconds(4)),
			BackoffDecision::ShortCircuit { retry_in: Duration::seconds(6) }
		);
		assert_eq!(policy.failure_count(), DEFAULT_MAX_FAILURES);
	}

	#[test]
	fn reset_window_closes_the_circuit() {
		let mut policy = ErrorBackoffPolicy::default();

		fail_n(&mut policy, DEFAULT_MAX_FAILURES, T0);

		assert!(matches!(
			policy.permit(T0 + Duration::milliseconds(9_999)),
			BackoffDecision::ShortCircuit { .. }
		));
		assert_eq!(policy.permit(T0 + DEFAULT_RESET_WINDOW), BackoffDecision::Permit);
		assert_eq!(policy.state(), CircuitState::Closed);
		assert_eq!(policy.failure_count(), 0);
	}

	#[test]
	fn one_failure_after_reset_does_not_reopen() {
		let mut policy = ErrorBackoffPolicy::default();

		fail_n(&mut policy, DEFAULT_MAX_FAILURES, T0);

		let later = T0 + Duration::seconds(11);

		assert_eq!(policy.permit(later), BackoffDecision::Permit);

		policy.record_failure(later);

		assert_eq!(policy.failure_count(), 1);
		assert_eq!(policy.permit(later), BackoffDecision::Permit);
	}

	#[test]
	fn success_resets_counter_and_timestamp() {
		let mut policy = ErrorBackoffPolicy::default();

		fail_n(&mut policy, DEFAULT_MAX_FAILURES - 1, T0);
		policy.record_success();

		assert_eq!(
			policy.snapshot(),
			BackoffSnapshot { state: CircuitState::Closed, failure_count: 0, last_failure_at: None }
		);

		fail_n(&mut policy, DEFAULT_MAX_FAILURES - 1, T0 + Duration::minutes(5));

		assert_eq!(policy.state(), CircuitState::Closed);
	}

	#[test]
	fn zero_threshold_is_clamped() {
		let mut policy = ErrorBackoffPolicy::new(0, Duration::seconds(1));

		assert_eq!(policy.state(), CircuitState::Closed);

		policy.record_failure(T0);

		assert_eq!(policy.state(), CircuitState::Open);
	}
}
