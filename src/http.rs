//! Reqwest adapter that signs outbound requests with broker-issued tokens.
//!
//! [`AuthorizedClient`] is the HTTP-layer half of the broker contract: it asks
//! [`TokenBroker::get_token`] for a bearer token right before dispatch, sends the request
//! unauthenticated when none is available, and hands 401 responses to
//! [`TokenBroker::trigger_logout`].

// crates.io
use reqwest::{IntoUrl, Method, RequestBuilder, Response, StatusCode};
// self
use crate::{_prelude::*, broker::TokenBroker, obs};

/// Attaches broker-issued tokens to reqwest requests.
pub trait BearerAuthExt
where
	Self: Sized,
{
	/// Adds `Authorization: Bearer <token>` when the broker has a token, otherwise returns the
	/// request untouched.
	fn bearer_from(self, broker: &TokenBroker) -> impl Future<Output = Self> + Send;
}
impl BearerAuthExt for RequestBuilder {
	async fn bearer_from(self, broker: &TokenBroker) -> Self {
		match broker.get_token().await {
			Some(token) => self.bearer_auth(token.expose()),
			None => self,
		}
	}
}

/// Reqwest client wrapper bound to a [`TokenBroker`].
#[derive(Clone, Debug)]
pub struct AuthorizedClient {
	client: ReqwestClient,
	broker: TokenBroker,
}
impl AuthorizedClient {
	/// Wraps a default reqwest client.
	pub fn new(broker: TokenBroker) -> Self {
		Self::with_client(ReqwestClient::default(), broker)
	}

	/// Wraps an existing reqwest client.
	pub fn with_client(client: ReqwestClient, broker: TokenBroker) -> Self {
		Self { client, broker }
	}

	/// Returns the underlying reqwest client.
	pub fn client(&self) -> &ReqwestClient {
		&self.client
	}

	/// Returns the broker used to sign requests.
	pub fn broker(&self) -> &TokenBroker {
		&self.broker
	}

	/// Starts a request; finish it with [`AuthorizedClient::send`].
	pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
	where
		U: IntoUrl,
	{
		self.client.request(method, url)
	}

	/// Starts a `GET` request.
	pub fn get<U>(&self, url: U) -> RequestBuilder
	where
		U: IntoUrl,
	{
		self.request(Method::GET, url)
	}

	/// Starts a `POST` request.
	pub fn post<U>(&self, url: U) -> RequestBuilder
	where
		U: IntoUrl,
	{
		self.request(Method::POST, url)
	}

	/// Signs and sends `request`, resetting the session when the backend answers 401.
	///
	/// The response is returned as-is either way so callers can still render their own
	/// "not authenticated" state.
	pub async fn send(&self, request: RequestBuilder) -> Result<Response, ReqwestError> {
		let response = request.bearer_from(&self.broker).await.send().await?;

		if response.status() == StatusCode::UNAUTHORIZED {
			let outcome = self.broker.trigger_logout();

			obs::log_unauthorized(response.url(), outcome);
		}

		Ok(response)
	}
}
