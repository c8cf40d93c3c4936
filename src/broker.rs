//! The token broker: single-flight silent authentication behind a circuit breaker.
//!
//! A [`TokenBroker`] is the one place outbound requests ask for a bearer token. Hosts construct
//! it at boot, install their provider and logout callbacks with [`TokenBroker::setup`], and hand
//! clones to the HTTP layer. [`TokenBroker::get_token`] then guarantees that concurrent callers
//! share a single provider round trip, that a run of failures opens the breaker for the
//! configured window, and that `login_required`/`consent_required` rejections reset the session
//! through the [`LogoutTrigger`].

mod acquire;
mod metrics;

pub use metrics::BrokerMetrics;

// std
use std::sync::atomic::AtomicUsize;
// self
use crate::{
	_prelude::*,
	auth::{Identity, IdentityCache, SubjectId, TokenSecret},
	backoff::{BackoffSnapshot, ErrorBackoffPolicy},
	clock::{Clock, SystemClock},
	config::BrokerConfig,
	logout::{LogoutHandler, LogoutOutcome, LogoutTrigger, Navigator, StaticNavigator},
	obs,
	provider::{SilentAuthProvider, SilentAuthRequest},
};

/// Shared handle to the broker state; clones observe and mutate the same session.
#[derive(Clone)]
pub struct TokenBroker {
	inner: Arc<BrokerInner>,
}
impl TokenBroker {
	/// Creates a broker using the wall clock and a navigator parked on `/`.
	///
	/// Hosts with a router should prefer [`TokenBroker::with_parts`] so logout suppression sees
	/// the real current path.
	pub fn new(config: BrokerConfig) -> Self {
		Self::with_parts(config, Arc::new(SystemClock), Arc::new(StaticNavigator::default()))
	}

	/// Creates a broker that reads time and the current path from the provided collaborators.
	pub fn with_parts(
		config: BrokerConfig,
		clock: Arc<dyn Clock>,
		navigator: Arc<dyn Navigator>,
	) -> Self {
		let backoff = ErrorBackoffPolicy::new(config.max_failures, config.reset_window);
		let logout_trigger = LogoutTrigger::from_config(&config);

		Self {
			inner: Arc::new(BrokerInner {
				config,
				clock,
				navigator,
				logout_trigger,
				identity: IdentityCache::default(),
				callbacks: RwLock::new(Callbacks::default()),
				backoff: Mutex::new(backoff),
				in_flight: Mutex::new(None),
				metrics: BrokerMetrics::default(),
			}),
		}
	}

	/// Installs (or replaces) the provider and logout callbacks, and optionally the identity.
	///
	/// Safe to call at any time: an acquisition already in flight keeps the provider it started
	/// with, and the next acquisition uses the new one. Passing `None` for `identity` keeps the
	/// cached identity.
	pub fn setup(
		&self,
		provider: Arc<dyn SilentAuthProvider>,
		logout: Arc<dyn LogoutHandler>,
		identity: Option<Identity>,
	) {
		{
			let mut callbacks = self.inner.callbacks.write();

			callbacks.provider = Some(provider);
			callbacks.logout = Some(logout);
		}

		if let Some(identity) = identity {
			self.inner.identity.set(identity);
		}
	}

	/// Replaces the cached identity without touching the callbacks.
	pub fn set_identity(&self, identity: Identity) {
		self.inner.identity.set(identity);
	}

	/// Returns the cached subject, if any.
	pub fn current_subject(&self) -> Option<SubjectId> {
		self.inner.identity.subject()
	}

	/// Returns the full cached identity, if any.
	pub fn current_identity(&self) -> Option<Identity> {
		self.inner.identity.snapshot()
	}

	/// Returns a bearer token, or `None` when the caller should proceed unauthenticated.
	///
	/// Never fails: circuit-open, unconfigured, timed-out, and rejected acquisitions all resolve
	/// to `None`. Use [`TokenBroker::acquire`] to see why.
	pub async fn get_token(&self) -> Option<TokenSecret> {
		self.acquire().await.ok()
	}

	/// Asks the host to reset the session unless it is on the login or callback route.
	///
	/// Called by the broker on reauth-class rejections and by the HTTP layer on 401 responses.
	pub fn trigger_logout(&self) -> LogoutOutcome {
		let current_path = self.inner.navigator.current_path();
		let handler = self.inner.callbacks.read().logout.clone();
		let outcome = self.inner.logout_trigger.trigger(handler.as_deref(), &current_path);

		if outcome == LogoutOutcome::Invoked {
			self.inner.metrics.record_logout();
		}

		obs::record_logout_outcome(outcome);
		obs::log_logout(outcome, &current_path);

		outcome
	}

	/// Returns the breaker state as of now.
	pub fn backoff_snapshot(&self) -> BackoffSnapshot {
		self.inner.backoff.lock().snapshot()
	}

	/// Returns `true` while a silent-auth round trip is outstanding.
	pub fn is_in_flight(&self) -> bool {
		self.inner.in_flight.lock().is_some()
	}

	/// Returns the broker's activity counters.
	pub fn metrics(&self) -> &BrokerMetrics {
		&self.inner.metrics
	}

	/// Returns the configuration the broker was built with.
	pub fn config(&self) -> &BrokerConfig {
		&self.inner.config
	}
}
impl Debug for TokenBroker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let (provider_set, logout_set) = {
			let callbacks = self.inner.callbacks.read();

			(callbacks.provider.is_some(), callbacks.logout.is_some())
		};

		f.debug_struct("TokenBroker")
			.field("audience", &self.inner.config.audience)
			.field("provider_set", &provider_set)
			.field("logout_set", &logout_set)
			.field("in_flight", &self.is_in_flight())
			.field("backoff", &self.backoff_snapshot())
			.finish()
	}
}

struct BrokerInner {
	config: BrokerConfig,
	clock: Arc<dyn Clock>,
	navigator: Arc<dyn Navigator>,
	logout_trigger: LogoutTrigger,
	identity: IdentityCache,
	callbacks: RwLock<Callbacks>,
	// Lock order: `in_flight` before `backoff`. `callbacks` is never held with either.
	backoff: Mutex<ErrorBackoffPolicy>,
	in_flight: Mutex<Option<Arc<Flight>>>,
	metrics: BrokerMetrics,
}

#[derive(Default)]
struct Callbacks {
	provider: Option<Arc<dyn SilentAuthProvider>>,
	logout: Option<Arc<dyn LogoutHandler>>,
}

/// One silent-auth round trip shared by every caller that arrives while it is outstanding.
///
/// The provider and request are captured when the flight starts so a concurrent `setup` cannot
/// change them mid-flight.
struct Flight {
	provider: Arc<dyn SilentAuthProvider>,
	request: SilentAuthRequest,
	// Callers still awaiting `outcome`; only changed under the `in_flight` lock.
	claims: AtomicUsize,
	outcome: OnceCell<Result<TokenSecret>>,
}
impl Flight {
	fn new(provider: Arc<dyn SilentAuthProvider>, request: SilentAuthRequest) -> Self {
		Self { provider, request, claims: AtomicUsize::new(1), outcome: OnceCell::new() }
	}
}
