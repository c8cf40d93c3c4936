// self
use crate::{logout::LogoutOutcome, obs::AcquireOutcome};

/// Records an acquisition outcome via the global metrics recorder (when enabled).
pub fn record_acquire_outcome(outcome: AcquireOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("token_broker_acquire_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

/// Records a logout decision via the global metrics recorder (when enabled).
pub fn record_logout_outcome(outcome: LogoutOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("token_broker_logout_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recorders_are_safe_without_a_global_recorder() {
		record_acquire_outcome(AcquireOutcome::Coalesced);
		record_logout_outcome(LogoutOutcome::SuppressedOnAuthRoute);
	}
}
