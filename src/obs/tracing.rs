// self
use crate::{_prelude::*, backoff::BackoffSnapshot, logout::LogoutOutcome};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedAcquire<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedAcquire<F> = F;

/// Span wrapper used around broker acquisitions.
#[derive(Clone, Debug)]
pub struct AcquireSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl AcquireSpan {
	/// Creates a new span tagged with the provided stage.
	pub fn new(stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::debug_span!("token_broker.acquire", stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = stage;

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedAcquire<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Logs a failed silent-auth round trip together with the breaker counters.
pub fn log_acquire_failure(error: &Error, backoff: &BackoffSnapshot) {
	#[cfg(feature = "tracing")]
	{
		let classification = match error {
			Error::ReauthRequired(_) => "reauth_required",
			Error::Timeout { .. } => "timeout",
			_ => "transient",
		};

		tracing::warn!(
			%error,
			classification,
			failure_count = backoff.failure_count,
			circuit = ?backoff.state,
			"silent authentication failed"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (error, backoff);
	}
}

/// Logs a call that never reached the provider.
pub fn log_acquire_skipped(error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(%error, "token acquisition skipped");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

/// Logs a logout decision and the route it was taken on.
pub fn log_logout(outcome: LogoutOutcome, current_path: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(outcome = outcome.as_str(), current_path, "logout requested");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (outcome, current_path);
	}
}

/// Logs a backend 401 and what the logout trigger did about it.
pub fn log_unauthorized(url: &Url, outcome: LogoutOutcome) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(%url, outcome = outcome.as_str(), "backend rejected bearer token");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (url, outcome);
	}
}
