//! Acquisition path: join-or-start, the bounded provider call, and settlement.
//!
//! Observing the in-flight slot, consulting the breaker, and committing a new flight happen
//! under one lock, so two callers can never both decide to contact the provider. Every caller
//! then awaits the flight's `OnceCell`; exactly one of them runs the provider call and the rest
//! receive a clone of its outcome.

// std
use std::sync::atomic::Ordering;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	backoff::BackoffDecision,
	broker::{Flight, TokenBroker},
	obs::{self, AcquireOutcome, AcquireSpan},
};

enum Ticket {
	Joined(Arc<Flight>),
	Started(Arc<Flight>),
}

/// One caller's hold on a flight.
///
/// When the last claim is dropped before the flight settles, nobody is left to drive the provider
/// call, so the slot is freed and the next acquisition starts over.
struct Claim<'a> {
	broker: &'a TokenBroker,
	flight: Arc<Flight>,
}
impl Drop for Claim<'_> {
	fn drop(&mut self) {
		let mut in_flight = self.broker.inner.in_flight.lock();
		let last = self.flight.claims.fetch_sub(1, Ordering::AcqRel) == 1;

		if last
			&& !self.flight.outcome.is_initialized()
			&& in_flight.as_ref().is_some_and(|current| Arc::ptr_eq(current, &self.flight))
		{
			*in_flight = None;
		}
	}
}

impl TokenBroker {
	/// Acquires a bearer token, reporting why when none is available.
	///
	/// Concurrent callers share one silent-auth round trip and all observe its outcome. The
	/// breaker and the failure classification behave exactly as for
	/// [`TokenBroker::get_token`].
	pub async fn acquire(&self) -> Result<TokenSecret> {
		let span = AcquireSpan::new("acquire");
		let result = span.instrument(self.acquire_shared()).await;

		obs::record_acquire_outcome(AcquireOutcome::of(&result));

		result
	}

	async fn acquire_shared(&self) -> Result<TokenSecret> {
		let flight = match self.join_or_start() {
			Ok(Ticket::Started(flight)) => flight,
			Ok(Ticket::Joined(flight)) => {
				self.inner.metrics.record_coalesced();
				obs::record_acquire_outcome(AcquireOutcome::Coalesced);

				flight
			},
			Err(err) => {
				obs::log_acquire_skipped(&err);

				return Err(err);
			},
		};

		let claim = Claim { broker: self, flight };

		claim.flight.outcome.get_or_init(|| self.run_flight(&claim.flight)).await.clone()
	}

	fn join_or_start(&self) -> Result<Ticket> {
		let provider = self.inner.callbacks.read().provider.clone();
		let mut in_flight = self.inner.in_flight.lock();

		if let Some(flight) = in_flight.as_ref() {
			flight.claims.fetch_add(1, Ordering::AcqRel);

			return Ok(Ticket::Joined(flight.clone()));
		}

		let decision = self.inner.backoff.lock().permit(self.inner.clock.now());

		if let BackoffDecision::ShortCircuit { retry_in } = decision {
			self.inner.metrics.record_short_circuit();

			return Err(Error::CircuitOpen { retry_in });
		}

		let provider = provider.ok_or(Error::NotConfigured)?;
		let flight = Arc::new(Flight::new(provider, self.inner.config.silent_auth_request()));

		*in_flight = Some(flight.clone());

		Ok(Ticket::Started(flight))
	}

	async fn run_flight(&self, flight: &Arc<Flight>) -> Result<TokenSecret> {
		let timeout = self.inner.config.acquire_timeout;

		self.inner.metrics.record_provider_call();
		obs::record_acquire_outcome(AcquireOutcome::Attempt);

		let call = flight.provider.get_token_silently(flight.request.clone());
		let result = match tokio::time::timeout(timeout.unsigned_abs(), call).await {
			Ok(Ok(token)) => Ok(token),
			Ok(Err(err)) => Err(Error::from_provider(err)),
			Err(_) => Err(Error::Timeout { timeout }),
		};

		self.settle(flight, &result);

		if result.as_ref().is_err_and(Error::is_reauth_required) {
			self.trigger_logout();
		}

		result
	}

	fn settle(&self, flight: &Arc<Flight>, result: &Result<TokenSecret>) {
		let now = self.inner.clock.now();
		let snapshot = {
			let mut in_flight = self.inner.in_flight.lock();
			let mut backoff = self.inner.backoff.lock();

			match result {
				Ok(_) => backoff.record_success(),
				Err(err) if err.counts_as_failure() => backoff.record_failure(now),
				Err(_) => {},
			}

			if in_flight.as_ref().is_some_and(|current| Arc::ptr_eq(current, flight)) {
				*in_flight = None;
			}

			backoff.snapshot()
		};

		match result {
			Ok(_) => self.inner.metrics.record_success(),
			Err(err) => {
				self.inner.metrics.record_failure();
				obs::log_acquire_failure(err, &snapshot);
			},
		}
	}
}
