//! Broker configuration, its builder, and validation.
//!
//! [`BrokerConfig`] carries everything the broker needs that is a deployment decision rather
//! than runtime state: the audience and scope requested from the provider, the redirect target,
//! breaker thresholds, the acquisition timeout, and the auth routes on which logout is
//! suppressed. Configs are built through [`BrokerConfigBuilder`] or deserialized from JSON;
//! both paths run the same validation.

// self
use crate::{
	_prelude::*,
	backoff::{DEFAULT_MAX_FAILURES, DEFAULT_RESET_WINDOW},
	error::ConfigError,
	provider::{CacheMode, SilentAuthRequest},
};

const DEFAULT_SCOPE: &str = "openid profile email";
const DEFAULT_ACQUIRE_TIMEOUT: Duration = Duration::seconds(60);
const DEFAULT_LOGIN_PATH: &str = "/login";
const DEFAULT_CALLBACK_PATH: &str = "/callback";

/// Validated broker configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BrokerConfigBuilder")]
pub struct BrokerConfig {
	/// API audience requested on every silent-auth call.
	pub audience: String,
	/// Space-delimited scope string.
	pub scope: String,
	/// Redirect target handed to the provider.
	pub redirect_uri: Url,
	/// Provider SDK cache policy.
	pub cache_mode: CacheMode,
	/// Consecutive failures tolerated before the circuit opens.
	pub max_failures: u32,
	/// Cooldown after the last failure before the circuit closes again.
	#[serde(with = "duration_ms")]
	pub reset_window: Duration,
	/// Upper bound on a single silent-auth round trip.
	#[serde(with = "duration_ms")]
	pub acquire_timeout: Duration,
	/// Login route; logout is suppressed while the host is on it.
	pub login_path: String,
	/// OAuth callback route; logout is suppressed while the host is on it.
	pub callback_path: String,
	/// Where the provider sends the browser after logout.
	pub logout_return_to: Url,
}
impl BrokerConfig {
	/// Creates a builder for the two settings that have no sensible default.
	pub fn builder(audience: impl Into<String>, redirect_uri: Url) -> BrokerConfigBuilder {
		BrokerConfigBuilder::new(audience, redirect_uri)
	}

	/// Parses and validates a JSON configuration document.
	pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(payload)
	}

	/// Builds the request handed to the provider on every silent-auth call.
	pub fn silent_auth_request(&self) -> SilentAuthRequest {
		SilentAuthRequest {
			audience: self.audience.clone(),
			scope: self.scope.clone(),
			redirect_uri: self.redirect_uri.clone(),
			cache_mode: self.cache_mode,
		}
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if self.audience.trim().is_empty() {
			return Err(ConfigError::EmptyAudience);
		}
		if self.max_failures == 0 {
			return Err(ConfigError::ZeroMaxFailures);
		}

		validate_url("redirect_uri", &self.redirect_uri)?;
		validate_url("logout_return_to", &self.logout_return_to)?;
		validate_positive("reset_window", self.reset_window)?;
		validate_positive("acquire_timeout", self.acquire_timeout)?;
		validate_route("login", &self.login_path)?;
		validate_route("callback", &self.callback_path)?;

		Ok(())
	}
}

/// Builder for [`BrokerConfig`] values.
///
/// Unset optional fields fall back to the defaults documented on each setter. The builder also
/// doubles as the serde representation, so JSON documents may omit any defaulted field.
#[derive(Clone, Debug, Deserialize)]
pub struct BrokerConfigBuilder {
	/// API audience.
	pub audience: String,
	/// Redirect target.
	pub redirect_uri: Url,
	/// Scope string.
	#[serde(default = "default_scope")]
	pub scope: String,
	/// SDK cache policy.
	#[serde(default)]
	pub cache_mode: CacheMode,
	/// Failure threshold.
	#[serde(default = "default_max_failures")]
	pub max_failures: u32,
	/// Breaker cooldown.
	#[serde(default = "default_reset_window", with = "duration_ms")]
	pub reset_window: Duration,
	/// Silent-auth timeout.
	#[serde(default = "default_acquire_timeout", with = "duration_ms")]
	pub acquire_timeout: Duration,
	/// Login route.
	#[serde(default = "default_login_path")]
	pub login_path: String,
	/// Callback route.
	#[serde(default = "default_callback_path")]
	pub callback_path: String,
	/// Post-logout destination.
	#[serde(default)]
	pub logout_return_to: Option<Url>,
}
impl BrokerConfigBuilder {
	/// Creates a builder seeded with the audience and redirect target.
	pub fn new(audience: impl Into<String>, redirect_uri: Url) -> Self {
		Self {
			audience: audience.into(),
			redirect_uri,
			scope: default_scope(),
			cache_mode: CacheMode::default(),
			max_failures: DEFAULT_MAX_FAILURES,
			reset_window: DEFAULT_RESET_WINDOW,
			acquire_timeout: DEFAULT_ACQUIRE_TIMEOUT,
			login_path: default_login_path(),
			callback_path: default_callback_path(),
			logout_return_to: None,
		}
	}

	/// Overrides the scope string (defaults to `openid profile email`).
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = scope.into();

		self
	}

	/// Overrides the SDK cache policy (defaults to [`CacheMode::On`]).
	pub fn cache_mode(mut self, mode: CacheMode) -> Self {
		self.cache_mode = mode;

		self
	}

	/// Overrides the failure threshold (defaults to 3).
	pub fn max_failures(mut self, max_failures: u32) -> Self {
		self.max_failures = max_failures;

		self
	}

	/// Overrides the breaker cooldown (defaults to 10 seconds).
	pub fn reset_window(mut self, window: Duration) -> Self {
		self.reset_window = window;

		self
	}

	/// Overrides the silent-auth timeout (defaults to 60 seconds).
	pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
		self.acquire_timeout = timeout;

		self
	}

	/// Overrides the login route (defaults to `/login`).
	pub fn login_path(mut self, path: impl Into<String>) -> Self {
		self.login_path = path.into();

		self
	}

	/// Overrides the callback route (defaults to `/callback`).
	pub fn callback_path(mut self, path: impl Into<String>) -> Self {
		self.callback_path = path.into();

		self
	}

	/// Overrides the post-logout destination (defaults to the site root of `redirect_uri`).
	pub fn logout_return_to(mut self, url: Url) -> Self {
		self.logout_return_to = Some(url);

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<BrokerConfig, ConfigError> {
		let logout_return_to =
			self.logout_return_to.unwrap_or_else(|| site_root(&self.redirect_uri));
		let config = BrokerConfig {
			audience: self.audience,
			scope: self.scope,
			redirect_uri: self.redirect_uri,
			cache_mode: self.cache_mode,
			max_failures: self.max_failures,
			reset_window: self.reset_window,
			acquire_timeout: self.acquire_timeout,
			login_path: self.login_path,
			callback_path: self.callback_path,
			logout_return_to,
		};

		config.validate()?;

		Ok(config)
	}
}
impl TryFrom<BrokerConfigBuilder> for BrokerConfig {
	type Error = ConfigError;

	fn try_from(builder: BrokerConfigBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}

mod duration_ms {
	// crates.io
	use serde::{Deserializer, Serializer};
	// self
	use crate::_prelude::*;

	pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_i64(i64::try_from(value.whole_milliseconds()).unwrap_or(i64::MAX))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		i64::deserialize(deserializer).map(Duration::milliseconds)
	}
}

fn default_scope() -> String {
	DEFAULT_SCOPE.into()
}

fn default_max_failures() -> u32 {
	DEFAULT_MAX_FAILURES
}

fn default_reset_window() -> Duration {
	DEFAULT_RESET_WINDOW
}

fn default_acquire_timeout() -> Duration {
	DEFAULT_ACQUIRE_TIMEOUT
}

fn default_login_path() -> String {
	DEFAULT_LOGIN_PATH.into()
}

fn default_callback_path() -> String {
	DEFAULT_CALLBACK_PATH.into()
}

fn site_root(url: &Url) -> Url {
	let mut root = url.clone();

	root.set_path("/");
	root.set_query(None);
	root.set_fragment(None);

	root
}

fn validate_url(field: &'static str, url: &Url) -> Result<(), ConfigError> {
	if matches!(url.scheme(), "http" | "https") && url.has_host() {
		Ok(())
	} else {
		Err(ConfigError::InvalidUrl { field, url: url.to_string() })
	}
}

fn validate_positive(field: &'static str, value: Duration) -> Result<(), ConfigError> {
	if value.is_positive() { Ok(()) } else { Err(ConfigError::NonPositiveDuration { field }) }
}

fn validate_route(route: &'static str, path: &str) -> Result<(), ConfigError> {
	if path.starts_with('/') {
		Ok(())
	} else {
		Err(ConfigError::InvalidRoutePath { route, path: path.to_owned() })
	}
}
