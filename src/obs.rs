//! Optional observability helpers for token acquisition and logout.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `token_broker.acquire` with a `stage` field, plus
//!   `debug`/`warn` events describing failures, their classification, and the breaker counters.
//! - Enable `metrics` to increment `token_broker_acquire_total` (labeled by `outcome`) for every
//!   caller and `token_broker_logout_total` (labeled by `outcome`) for every logout decision.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Per-caller acquisition outcomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AcquireOutcome {
	/// A silent-auth round trip was started.
	Attempt,
	/// The caller received a token.
	Success,
	/// The caller joined an acquisition that was already in flight.
	Coalesced,
	/// The breaker short-circuited the call.
	CircuitOpen,
	/// No provider was installed.
	NotConfigured,
	/// The provider demanded interactive sign-in.
	ReauthRequired,
	/// The provider failed transiently.
	Transient,
	/// The provider did not answer in time.
	Timeout,
}
impl AcquireOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AcquireOutcome::Attempt => "attempt",
			AcquireOutcome::Success => "success",
			AcquireOutcome::Coalesced => "coalesced",
			AcquireOutcome::CircuitOpen => "circuit_open",
			AcquireOutcome::NotConfigured => "not_configured",
			AcquireOutcome::ReauthRequired => "reauth_required",
			AcquireOutcome::Transient => "transient",
			AcquireOutcome::Timeout => "timeout",
		}
	}

	/// Maps a caller-visible result onto its outcome label.
	pub fn of<T>(result: &Result<T>) -> Self {
		match result {
			Ok(_) => AcquireOutcome::Success,
			Err(Error::CircuitOpen { .. }) => AcquireOutcome::CircuitOpen,
			Err(Error::NotConfigured) => AcquireOutcome::NotConfigured,
			Err(Error::ReauthRequired(_)) => AcquireOutcome::ReauthRequired,
			Err(Error::Transient(_)) => AcquireOutcome::Transient,
			Err(Error::Timeout { .. }) => AcquireOutcome::Timeout,
		}
	}
}
impl Display for AcquireOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
