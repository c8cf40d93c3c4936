//! Identity-provider seam: the silent-auth contract and the provider error taxonomy.
//!
//! The broker never talks to an identity provider directly. Hosts hand it a
//! [`SilentAuthProvider`] (usually a thin wrapper over their SDK's "get token silently"
//! call) and the broker classifies rejections with [`ProviderError::kind`].

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Boxed future returned by [`SilentAuthProvider::get_token_silently`].
pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ProviderError>> + 'a + Send>>;

/// One silent re-authentication round trip against the identity provider.
///
/// Implementations resolve with a bearer token or reject with the provider's
/// `{ error, error_description }` payload. Async closures taking a [`SilentAuthRequest`] and
/// resolving to `Result<String, ProviderError>` implement the trait automatically.
pub trait SilentAuthProvider
where
	Self: Send + Sync,
{
	/// Attempts to obtain a fresh token without user interaction.
	fn get_token_silently(&self, request: SilentAuthRequest) -> ProviderFuture<'_, TokenSecret>;
}
impl<F, Fut> SilentAuthProvider for F
where
	F: Send + Sync + Fn(SilentAuthRequest) -> Fut,
	Fut: 'static + Send + Future<Output = Result<String, ProviderError>>,
{
	fn get_token_silently(&self, request: SilentAuthRequest) -> ProviderFuture<'_, TokenSecret> {
		let call = self(request);

		Box::pin(async move { call.await.map(TokenSecret::new) })
	}
}

/// How the provider SDK may use its own token cache.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheMode {
	#[default]
	/// Serve from the SDK cache when possible, otherwise call the provider.
	On,
	/// Always call the provider.
	Off,
	/// Only consult the SDK cache; never call the provider.
	CacheOnly,
}
impl CacheMode {
	/// Returns the wire label understood by provider SDKs.
	pub const fn as_str(self) -> &'static str {
		match self {
			CacheMode::On => "on",
			CacheMode::Off => "off",
			CacheMode::CacheOnly => "cache-only",
		}
	}
}
impl Display for CacheMode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Parameters handed to the provider for every silent-auth call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SilentAuthRequest {
	/// API audience the token must be minted for.
	pub audience: String,
	/// Space-delimited scope string.
	pub scope: String,
	/// Deployment redirect target; never derived from the ambient page location.
	pub redirect_uri: Url,
	/// SDK cache policy.
	pub cache_mode: CacheMode,
}

/// Provider error classes the broker acts on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
	/// The session cannot be refreshed silently; the subject must sign in again.
	ReauthRequired,
	/// Network or unknown failure; "no token right now".
	Transient,
}
impl ProviderErrorKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			ProviderErrorKind::ReauthRequired => "reauth_required",
			ProviderErrorKind::Transient => "transient",
		}
	}
}
impl Display for ProviderErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Rejection raised by the identity provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error(
	"{error}{}",
	.error_description.as_deref().map(|description| format!(" ({description})")).unwrap_or_default()
)]
pub struct ProviderError {
	/// Provider error code (`login_required`, `consent_required`, `timeout`, ...).
	pub error: String,
	/// Human-readable detail supplied by the provider.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error_description: Option<String>,
}
impl ProviderError {
	/// Code used by [`ProviderError::network`].
	pub const NETWORK_ERROR: &'static str = "network_error";

	/// Creates an error carrying only the provider code.
	pub fn new(error: impl Into<String>) -> Self {
		Self { error: error.into(), error_description: None }
	}

	/// Convenience constructor for failures that never reached the provider.
	pub fn network(description: impl Into<String>) -> Self {
		Self::new(Self::NETWORK_ERROR).with_description(description)
	}

	/// Adds the provider's `error_description`.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.error_description = Some(description.into());

		self
	}

	/// Parses the provider's JSON error payload.
	pub fn from_json(payload: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(payload)
	}

	/// Classifies the rejection.
	pub fn kind(&self) -> ProviderErrorKind {
		classify_error_code(&self.error)
	}
}

/// Maps a provider error code onto the broker taxonomy.
///
/// `login_required` and `consent_required` mean the session is unrecoverable without interactive
/// sign-in; every other code is transient.
pub fn classify_error_code(code: &str) -> ProviderErrorKind {
	if code.eq_ignore_ascii_case("login_required") || code.eq_ignore_ascii_case("consent_required")
	{
		ProviderErrorKind::ReauthRequired
	} else {
		ProviderErrorKind::Transient
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn reauth_codes_are_recognized() {
		assert_eq!(classify_error_code("login_required"), ProviderErrorKind::ReauthRequired);
		assert_eq!(classify_error_code("consent_required"), ProviderErrorKind::ReauthRequired);
		assert_eq!(classify_error_code("LOGIN_REQUIRED"), ProviderErrorKind::ReauthRequired);
	}

	#[test]
	fn everything_else_is_transient() {
		for code in ["timeout", "missing_refresh_token", "invalid_grant", "interaction_required", ""]
		{
			assert_eq!(classify_error_code(code), ProviderErrorKind::Transient, "code `{code}`");
		}

		assert_eq!(ProviderError::network("connection reset").kind(), ProviderErrorKind::Transient);
	}

	#[test]
	fn json_payload_parses_with_optional_description() {
		let err = ProviderError::from_json(
			r#"{"error":"consent_required","error_description":"Consent required"}"#,
		)
		.expect("Provider payload should parse.");

		assert_eq!(err.kind(), ProviderErrorKind::ReauthRequired);
		assert_eq!(err.to_string(), "consent_required (Consent required)");

		let bare = ProviderError::from_json(r#"{"error":"timeout"}"#)
			.expect("Payload without description should parse.");

		assert_eq!(bare, ProviderError::new("timeout"));
		assert_eq!(bare.to_string(), "timeout");
		assert!(ProviderError::from_json(r#"{"error_description":"no code"}"#).is_err());
	}

	#[test]
	fn cache_mode_labels_match_serde() {
		for mode in [CacheMode::On, CacheMode::Off, CacheMode::CacheOnly] {
			let encoded = serde_json::to_string(&mode).expect("Cache mode should serialize.");

			assert_eq!(encoded, format!("\"{}\"", mode.as_str()));
		}
	}

	#[tokio::test]
	async fn async_closures_act_as_providers() {
		let provider = |request: SilentAuthRequest| async move {
			if request.audience.is_empty() {
				Err(ProviderError::new("invalid_request"))
			} else {
				Ok(format!("token-for-{}", request.audience))
			}
		};
		let request = SilentAuthRequest {
			audience: "orders".into(),
			scope: "openid".into(),
			redirect_uri: Url::parse("https://shop.storefront.test/callback")
				.expect("Redirect fixture should parse."),
			cache_mode: CacheMode::Off,
		};
		let token = provider
			.get_token_silently(request)
			.await
			.expect("Closure provider should resolve with a token.");

		assert_eq!(token.expose(), "token-for-orders");
	}
}
