// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for broker activity.
///
/// Provider-facing counters (`provider_calls`, `successes`, `failures`) move once per
/// silent-auth round trip no matter how many callers shared it.
#[derive(Debug, Default)]
pub struct BrokerMetrics {
	provider_calls: AtomicU64,
	successes: AtomicU64,
	failures: AtomicU64,
	short_circuits: AtomicU64,
	coalesced: AtomicU64,
	logouts: AtomicU64,
}
impl BrokerMetrics {
	/// Returns the number of silent-auth round trips started.
	pub fn provider_calls(&self) -> u64 {
		self.provider_calls.load(Ordering::Relaxed)
	}

	/// Returns the number of round trips that produced a token.
	pub fn successes(&self) -> u64 {
		self.successes.load(Ordering::Relaxed)
	}

	/// Returns the number of round trips that failed (including timeouts).
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	/// Returns the number of calls refused by the open circuit.
	pub fn short_circuits(&self) -> u64 {
		self.short_circuits.load(Ordering::Relaxed)
	}

	/// Returns the number of callers that joined an in-flight round trip.
	pub fn coalesced(&self) -> u64 {
		self.coalesced.load(Ordering::Relaxed)
	}

	/// Returns the number of times the host logout routine was invoked.
	pub fn logouts(&self) -> u64 {
		self.logouts.load(Ordering::Relaxed)
	}

	pub(crate) fn record_provider_call(&self) {
		self.provider_calls.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.successes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_short_circuit(&self) {
		self.short_circuits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_coalesced(&self) {
		self.coalesced.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_logout(&self) {
		self.logouts.fetch_add(1, Ordering::Relaxed);
	}
}
