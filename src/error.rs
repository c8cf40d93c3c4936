//! Broker-level error types shared across acquisition, configuration, and classification.

// self
use crate::{
	_prelude::*,
	provider::{ProviderError, ProviderErrorKind},
};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical broker error exposed by [`TokenBroker::acquire`](crate::broker::TokenBroker::acquire).
///
/// Every variant collapses to "no token" at the [`get_token`](crate::broker::TokenBroker::get_token)
/// boundary; the typed form exists for logging and for hosts that want to tell the cases apart.
/// The enum is `Clone` because a single in-flight outcome is shared with every waiting caller.
#[derive(Clone, Debug, ThisError)]
pub enum Error {
	/// Repeated failures opened the circuit; the provider was not contacted.
	#[error("Token acquisition is short-circuited for another {retry_in}.")]
	CircuitOpen {
		/// Time left until the reset window elapses.
		retry_in: Duration,
	},
	/// No silent-auth provider has been installed through `setup`.
	#[error("No silent-auth provider is installed.")]
	NotConfigured,
	/// The session cannot be refreshed without interactive sign-in.
	#[error("Identity provider requires interactive re-authentication.")]
	ReauthRequired(#[source] ProviderError),
	/// Temporary provider failure; the caller may try again later.
	#[error("Identity provider failed transiently.")]
	Transient(#[source] ProviderError),
	/// The provider did not answer within the configured acquisition timeout.
	#[error("Silent authentication did not complete within {timeout}.")]
	Timeout {
		/// Timeout that elapsed.
		timeout: Duration,
	},
}
impl Error {
	/// Wraps a provider rejection according to its classification.
	pub fn from_provider(error: ProviderError) -> Self {
		match error.kind() {
			ProviderErrorKind::ReauthRequired => Self::ReauthRequired(error),
			ProviderErrorKind::Transient => Self::Transient(error),
		}
	}

	/// Returns `true` when the session must be reset through logout.
	pub fn is_reauth_required(&self) -> bool {
		matches!(self, Self::ReauthRequired(_))
	}

	/// Returns `true` when the failure should count against the backoff policy.
	///
	/// Short-circuited and unconfigured calls never reach the provider, so they do not count.
	pub fn counts_as_failure(&self) -> bool {
		matches!(self, Self::ReauthRequired(_) | Self::Transient(_) | Self::Timeout { .. })
	}
}

/// Configuration and validation failures raised while building a [`BrokerConfig`](crate::config::BrokerConfig).
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ConfigError {
	/// Audience must be a non-blank identifier.
	#[error("Audience cannot be empty.")]
	EmptyAudience,
	/// URLs handed to the provider or the logout routine must be absolute http(s) URLs.
	#[error("The {field} URL must use http or https: {url}.")]
	InvalidUrl {
		/// Configuration field that failed validation.
		field: &'static str,
		/// Offending URL.
		url: String,
	},
	/// At least one failure is required before the circuit opens.
	#[error("The failure threshold must be at least 1.")]
	ZeroMaxFailures,
	/// Durations must be strictly positive.
	#[error("The {field} duration must be positive.")]
	NonPositiveDuration {
		/// Configuration field that failed validation.
		field: &'static str,
	},
	/// Route paths must be absolute.
	#[error("The {route} route must start with '/': {path}.")]
	InvalidRoutePath {
		/// Route label (login or callback).
		route: &'static str,
		/// Offending path.
		path: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn provider_errors_wrap_by_classification() {
		let reauth = Error::from_provider(ProviderError::new("consent_required"));
		let transient = Error::from_provider(ProviderError::new("timeout"));

		assert!(reauth.is_reauth_required());
		assert!(matches!(transient, Error::Transient(_)));
		assert!(transient.counts_as_failure());
		assert!(!Error::NotConfigured.counts_as_failure());
		assert!(!Error::CircuitOpen { retry_in: Duration::seconds(1) }.counts_as_failure());
	}

	#[test]
	fn provider_error_is_exposed_as_source() {
		let err = Error::from_provider(
			ProviderError::new("login_required").with_description("Login required"),
		);
		let source = std::error::Error::source(&err)
			.expect("Reauth errors should expose the provider rejection as their source.");

		assert_eq!(source.to_string(), "login_required (Login required)");
	}
}
