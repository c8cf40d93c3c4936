//! Session-reset trigger and the host collaborators it talks to.
//!
//! Logging out from the login or callback route would bounce the browser straight back into
//! the same token failure, so [`LogoutTrigger::trigger`] refuses to act while the host sits on
//! either route. The current path is an explicit argument; the broker reads it from its
//! [`Navigator`] right before delegating.

// self
use crate::{_prelude::*, config::BrokerConfig};

/// Instruction handed to the host logout routine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoutOptions {
	/// Where the provider should send the browser once the session is cleared.
	pub return_to: Url,
}

/// Host logout routine, typically the identity SDK's `logout`.
///
/// Plain closures taking [`LogoutOptions`] implement the trait automatically.
pub trait LogoutHandler
where
	Self: Send + Sync,
{
	/// Hands control to the identity provider's logout flow.
	fn logout(&self, options: LogoutOptions);
}
impl<F> LogoutHandler for F
where
	F: Send + Sync + Fn(LogoutOptions),
{
	fn logout(&self, options: LogoutOptions) {
		self(options)
	}
}

/// Read-only view of the host router.
///
/// Plain closures returning the current path implement the trait automatically.
pub trait Navigator
where
	Self: Send + Sync,
{
	/// Returns the path the host is currently showing (query and fragment allowed).
	fn current_path(&self) -> String;
}
impl<F> Navigator for F
where
	F: Send + Sync + Fn() -> String,
{
	fn current_path(&self) -> String {
		self()
	}
}

/// Navigator for hosts without a router; clones share the same path.
#[derive(Clone, Debug)]
pub struct StaticNavigator(Arc<RwLock<String>>);
impl StaticNavigator {
	/// Creates a navigator parked on `path`.
	pub fn new(path: impl Into<String>) -> Self {
		Self(Arc::new(RwLock::new(path.into())))
	}

	/// Moves the navigator to `path`.
	pub fn set(&self, path: impl Into<String>) {
		*self.0.write() = path.into();
	}
}
impl Default for StaticNavigator {
	fn default() -> Self {
		Self::new("/")
	}
}
impl Navigator for StaticNavigator {
	fn current_path(&self) -> String {
		self.0.read().clone()
	}
}

/// What [`LogoutTrigger::trigger`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LogoutOutcome {
	/// The host logout routine was invoked.
	Invoked,
	/// The host is on the login or callback route; nothing happened.
	SuppressedOnAuthRoute,
	/// No logout routine is installed; nothing happened.
	NotConfigured,
}
impl LogoutOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			LogoutOutcome::Invoked => "invoked",
			LogoutOutcome::SuppressedOnAuthRoute => "suppressed_on_auth_route",
			LogoutOutcome::NotConfigured => "not_configured",
		}
	}
}
impl Display for LogoutOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Decides whether a logout request may reach the host logout routine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogoutTrigger {
	login_path: String,
	callback_path: String,
	return_to: Url,
}
impl LogoutTrigger {
	/// Creates a trigger for the given auth routes and post-logout destination.
	pub fn new(login_path: impl AsRef<str>, callback_path: impl AsRef<str>, return_to: Url) -> Self {
		Self {
			login_path: normalize_path(login_path.as_ref()).to_owned(),
			callback_path: normalize_path(callback_path.as_ref()).to_owned(),
			return_to,
		}
	}

	/// Creates a trigger from the broker configuration.
	pub fn from_config(config: &BrokerConfig) -> Self {
		Self::new(&config.login_path, &config.callback_path, config.logout_return_to.clone())
	}

	/// Returns `true` when `current_path` is the login or callback route.
	///
	/// Query strings, fragments, and a trailing slash are ignored.
	pub fn is_auth_route(&self, current_path: &str) -> bool {
		let path = normalize_path(current_path);

		path == self.login_path || path == self.callback_path
	}

	/// Invokes `handler` unless it is missing or the host is on an auth route.
	pub fn trigger(&self, handler: Option<&dyn LogoutHandler>, current_path: &str) -> LogoutOutcome {
		let Some(handler) = handler else {
			return LogoutOutcome::NotConfigured;
		};

		if self.is_auth_route(current_path) {
			return LogoutOutcome::SuppressedOnAuthRoute;
		}

		handler.logout(LogoutOptions { return_to: self.return_to.clone() });

		LogoutOutcome::Invoked
	}
}

fn normalize_path(path: &str) -> &str {
	let end = path.find(['?', '#']).unwrap_or(path.len());
	let path = &path[..end];
	let trimmed = path.trim_end_matches('/');

	if trimmed.is_empty() { "/" } else { trimmed }
}
