//! Authenticated identity snapshot and the read cache that holds it for the session.

// self
use crate::{_prelude::*, auth::SubjectId};

/// Snapshot of the signed-in subject and the display attributes the UI needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
	/// Identity-provider subject.
	pub subject: SubjectId,
	/// Display name, when the provider shares one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Email address, when the provider shares one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub email: Option<String>,
	/// Avatar URL, when the provider shares one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub picture: Option<Url>,
}
impl Identity {
	/// Creates an identity carrying only the subject.
	pub fn new(subject: SubjectId) -> Self {
		Self { subject, name: None, email: None, picture: None }
	}

	/// Sets the display name.
	pub fn with_name(mut self, name: impl Into<String>) -> Self {
		self.name = Some(name.into());

		self
	}

	/// Sets the email address.
	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());

		self
	}

	/// Sets the avatar URL.
	pub fn with_picture(mut self, picture: Url) -> Self {
		self.picture = Some(picture);

		self
	}
}

/// Holds the currently known identity; written by the host, read by everyone else.
#[derive(Debug, Default)]
pub struct IdentityCache(RwLock<Option<Identity>>);
impl IdentityCache {
	/// Replaces the cached identity.
	pub fn set(&self, identity: Identity) {
		*self.0.write() = Some(identity);
	}

	/// Returns a clone of the cached identity.
	pub fn snapshot(&self) -> Option<Identity> {
		self.0.read().clone()
	}

	/// Returns the cached subject without cloning the display attributes.
	pub fn subject(&self) -> Option<SubjectId> {
		self.0.read().as_ref().map(|identity| identity.subject.clone())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn shopper() -> Identity {
		Identity::new(SubjectId::new("auth0|shopper-1").expect("Subject fixture should be valid."))
			.with_name("Ada Shopper")
			.with_email("ada@storefront.test")
	}

	#[test]
	fn cache_starts_empty_and_tracks_replacements() {
		let cache = IdentityCache::default();

		assert!(cache.subject().is_none());

		cache.set(shopper());

		assert_eq!(cache.subject().as_deref(), Some("auth0|shopper-1"));

		let seller = Identity::new(SubjectId::new("auth0|seller-9").expect("Subject should be valid."));

		cache.set(seller.clone());

		assert_eq!(cache.snapshot(), Some(seller));
	}

	#[test]
	fn optional_attributes_are_omitted_from_json() {
		let payload = serde_json::to_value(
			Identity::new(SubjectId::new("auth0|x").expect("Subject should be valid.")),
		)
		.expect("Identity should serialize.");

		assert_eq!(payload, serde_json::json!({ "subject": "auth0|x" }));

		let parsed: Identity = serde_json::from_value(serde_json::json!({
			"subject": "auth0|shopper-1",
			"name": "Ada Shopper",
			"email": "ada@storefront.test"
		}))
		.expect("Identity should deserialize.");

		assert_eq!(parsed, shopper());
	}
}
