//! External OAuth credential records and staleness rules.

// self
use crate::{
	_prelude::*,
	auth::{IdentityId, TokenSecret},
};

/// OAuth credential minted by the external provider for one local identity.
#[derive(Clone, Serialize, Deserialize)]
pub struct ExternalCredential {
	/// Owning identity; at most one credential exists per identity.
	pub identity: IdentityId,
	/// Access token presented to the provider's API.
	pub access_token: TokenSecret,
	/// Refresh token, when the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Expiry instant of the access token, when known.
	pub expires_at: Option<OffsetDateTime>,
	/// Instant the credential was first stored; preserved across updates.
	pub created_at: OffsetDateTime,
	/// Instant of the most recent write.
	pub updated_at: OffsetDateTime,
}
impl ExternalCredential {
	/// Returns `true` when the credential has no expiry or the expiry is at or before `now`.
	pub fn is_stale_at(&self, now: OffsetDateTime) -> bool {
		match self.expires_at {
			Some(expires_at) => expires_at <= now,
			None => true,
		}
	}

	/// Convenience helper that checks staleness against the current UTC instant.
	pub fn is_stale(&self) -> bool {
		self.is_stale_at(OffsetDateTime::now_utc())
	}
}
/// Returns `true` when `credential` is absent, has no expiry, or expired at or before `now`.
pub fn is_stale_at(credential: Option<&ExternalCredential>, now: OffsetDateTime) -> bool {
	credential.is_none_or(|credential| credential.is_stale_at(now))
}

/// Convenience helper that checks [`is_stale_at`] against the current UTC instant.
pub fn is_stale(credential: Option<&ExternalCredential>) -> bool {
	is_stale_at(credential, OffsetDateTime::now_utc())
}

impl Debug for ExternalCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExternalCredential")
			.field("identity", &self.identity)
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.field("created_at", &self.created_at)
			.field("updated_at", &self.updated_at)
			.finish()
	}
}

/// Replacement values written by an upsert.
#[derive(Clone)]
pub struct CredentialUpdate {
	/// New access token.
	pub access_token: TokenSecret,
	/// New refresh token; `None` clears it.
	pub refresh_token: Option<TokenSecret>,
	/// New expiry instant.
	pub expires_at: Option<OffsetDateTime>,
}
impl CredentialUpdate {
	/// Creates an update carrying only an access token.
	pub fn new(access_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: None, expires_at: None }
	}

	/// Sets the refresh token.
	pub fn refresh_token(mut self, refresh_token: impl Into<TokenSecret>) -> Self {
		self.refresh_token = Some(refresh_token.into());

		self
	}

	/// Sets or clears the refresh token.
	pub fn with_refresh_token(mut self, refresh_token: Option<TokenSecret>) -> Self {
		self.refresh_token = refresh_token;

		self
	}

	/// Sets the expiry instant.
	pub fn expires_at(mut self, expires_at: OffsetDateTime) -> Self {
		self.expires_at = Some(expires_at);

		self
	}

	/// Sets or clears the expiry instant.
	pub fn with_expires_at(mut self, expires_at: Option<OffsetDateTime>) -> Self {
		self.expires_at = expires_at;

		self
	}

	/// Applies the update on top of `current`, or creates a fresh credential at `now`.
	pub fn apply(
		self,
		identity: &IdentityId,
		current: Option<&ExternalCredential>,
		now: OffsetDateTime,
	) -> ExternalCredential {
		let created_at = current.map(|existing| existing.created_at).unwrap_or(now);

		ExternalCredential {
			identity: identity.to_owned(),
			access_token: self.access_token,
			refresh_token: self.refresh_token,
			expires_at: self.expires_at,
			created_at,
			updated_at: now,
		}
	}
}
impl Debug for CredentialUpdate {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialUpdate")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn identity() -> IdentityId {
		IdentityId::new("ada@example.com").expect("Identity fixture should be valid.")
	}

	#[test]
	fn staleness_treats_expiry_as_exclusive() {
		let now = macros::datetime!(2025-11-10 12:00 UTC);
		let credential = CredentialUpdate::new("access")
			.expires_at(now)
			.apply(&identity(), None, now - Duration::hours(1));

		assert!(credential.is_stale_at(now));
		assert!(!credential.is_stale_at(now - Duration::seconds(1)));
	}

	#[test]
	fn absent_credentials_are_stale() {
		assert!(is_stale_at(None, macros::datetime!(2025-11-10 12:00 UTC)));
	}

	#[test]
	fn missing_expiry_is_always_stale() {
		let now = macros::datetime!(2025-11-10 12:00 UTC);
		let credential = CredentialUpdate::new("access").apply(&identity(), None, now);

		assert!(credential.is_stale_at(now - Duration::days(365)));
	}

	#[test]
	fn apply_keeps_creation_time_and_replaces_every_field() {
		let created = macros::datetime!(2025-11-10 12:00 UTC);
		let later = created + Duration::hours(2);
		let first = CredentialUpdate::new("access-1")
			.refresh_token("refresh-1")
			.expires_at(created + Duration::hours(1))
			.apply(&identity(), None, created);
		let second = CredentialUpdate::new("access-2")
			.expires_at(later + Duration::hours(1))
			.apply(&identity(), Some(&first), later);

		assert_eq!(second.created_at, created);
		assert_eq!(second.updated_at, later);
		assert_eq!(second.access_token.expose(), "access-2");
		assert!(second.refresh_token.is_none());
		assert_eq!(second.expires_at, Some(later + Duration::hours(1)));
	}

	#[test]
	fn debug_output_redacts_tokens() {
		let now = macros::datetime!(2025-11-10 12:00 UTC);
		let credential =
			CredentialUpdate::new("access-secret").refresh_token("refresh-secret").apply(
				&identity(),
				None,
				now,
			);
		let rendered = format!("{credential:?}");

		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("refresh-secret"));
	}
}
