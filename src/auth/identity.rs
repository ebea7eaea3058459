//! Identity records and the repository contract the authenticator resolves subjects against.

// self
use crate::{
	_prelude::*,
	auth::{IdentityId, TokenSecret},
	store::StoreFuture,
};

/// Authority granting access to administrative operations.
pub const ADMIN_AUTHORITY: &str = "ROLE_ADMIN";

/// Granted authority such as `ROLE_USER` or `ROLE_ADMIN`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Authority(String);
impl Authority {
	/// Wraps an authority name.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the authority name.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for Authority {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Account state flags attached to an identity.
///
/// Password sign-in requires a usable account (see [`AccountFlags::is_usable`]). Bearer
/// authentication binds identities regardless of these flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountFlags {
	/// Account may sign in.
	pub enabled: bool,
	/// Account has been locked.
	pub locked: bool,
	/// Account has expired.
	pub expired: bool,
	/// Stored password has expired.
	pub credentials_expired: bool,
}
impl AccountFlags {
	/// Returns `true` when the account is enabled and neither locked nor expired.
	pub fn is_usable(&self) -> bool {
		self.enabled && !self.locked && !self.expired && !self.credentials_expired
	}
}
impl Default for AccountFlags {
	fn default() -> Self {
		Self { enabled: true, locked: false, expired: false, credentials_expired: false }
	}
}

/// Stored identity resolved from a token subject.
#[derive(Clone, Serialize, Deserialize)]
pub struct Identity {
	/// E-mail address; also the token subject.
	pub id: IdentityId,
	/// Password hash, when the identity signs in with a password.
	pub password_hash: Option<TokenSecret>,
	/// Granted authorities.
	pub authorities: Vec<Authority>,
	/// Account state flags.
	pub flags: AccountFlags,
}
impl Identity {
	/// Creates an enabled identity without authorities.
	pub fn new(id: IdentityId) -> Self {
		Self { id, password_hash: None, authorities: Vec::new(), flags: AccountFlags::default() }
	}

	/// Adds a granted authority.
	pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
		self.authorities.push(Authority::new(authority));

		self
	}

	/// Sets the stored password hash.
	pub fn with_password_hash(mut self, hash: impl Into<TokenSecret>) -> Self {
		self.password_hash = Some(hash.into());

		self
	}

	/// Overrides the account flags.
	pub fn with_flags(mut self, flags: AccountFlags) -> Self {
		self.flags = flags;

		self
	}

	/// Returns `true` when the identity holds the named authority.
	pub fn has_authority(&self, authority: &str) -> bool {
		self.authorities.iter().any(|granted| granted.as_str() == authority)
	}

	/// Returns `true` when the identity holds [`ADMIN_AUTHORITY`].
	pub fn is_admin(&self) -> bool {
		self.has_authority(ADMIN_AUTHORITY)
	}
}
impl Debug for Identity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Identity")
			.field("id", &self.id)
			.field("password_hash", &self.password_hash.as_ref().map(|_| "<redacted>"))
			.field("authorities", &self.authorities)
			.field("flags", &self.flags)
			.finish()
	}
}

/// Repository contract for identities keyed by e-mail.
pub trait IdentityStore
where
	Self: Send + Sync,
{
	/// Looks up an identity by e-mail; the comparison ignores ASCII case.
	fn find_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<Identity>>;
}

type IdentityMap = Arc<RwLock<HashMap<String, Identity>>>;

/// In-process [`IdentityStore`] for tests and single-node deployments.
#[derive(Clone, Debug, Default)]
pub struct MemoryIdentityStore(IdentityMap);
impl MemoryIdentityStore {
	/// Inserts or replaces an identity.
	pub fn insert(&self, identity: Identity) {
		self.0.write().insert(identity.id.to_ascii_lowercase(), identity);
	}

	/// Removes an identity, returning it when present.
	pub fn remove(&self, email: &str) -> Option<Identity> {
		self.0.write().remove(&email.to_ascii_lowercase())
	}

	fn find_now(map: &IdentityMap, email: &str) -> Option<Identity> {
		map.read().get(&email.to_ascii_lowercase()).cloned()
	}
}
impl IdentityStore for MemoryIdentityStore {
	fn find_by_email<'a>(&'a self, email: &'a str) -> StoreFuture<'a, Option<Identity>> {
		Box::pin(async move { Ok(Self::find_now(&self.0, email)) })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn identity(email: &str) -> Identity {
		Identity::new(IdentityId::new(email).expect("Identity fixture should be valid."))
	}

	#[tokio::test]
	async fn lookup_ignores_ascii_case() {
		let store = MemoryIdentityStore::default();

		store.insert(identity("Ada@Example.com").with_authority("ROLE_USER"));

		let found = store
			.find_by_email("ada@example.COM")
			.await
			.expect("Memory lookup should not fail.")
			.expect("Identity should be found regardless of case.");

		assert_eq!(found.id.as_ref(), "Ada@Example.com");
		assert!(found.has_authority("ROLE_USER"));
		assert!(!found.is_admin());
	}

	#[tokio::test]
	async fn removed_identities_are_not_found() {
		let store = MemoryIdentityStore::default();

		store.insert(identity("gone@example.com"));

		assert!(store.remove("GONE@example.com").is_some());
		assert!(
			store
				.find_by_email("gone@example.com")
				.await
				.expect("Memory lookup should not fail.")
				.is_none()
		);
	}

	#[test]
	fn debug_output_redacts_password_hash() {
		let rendered = format!("{:?}", identity("ada@example.com").with_password_hash("$2a$10$hash"));

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("$2a$10$hash"));
	}

	#[test]
	fn any_blocking_flag_makes_the_account_unusable() {
		let usable = AccountFlags::default();

		assert!(usable.is_usable());
		assert!(!AccountFlags { enabled: false, ..usable }.is_usable());
		assert!(!AccountFlags { locked: true, ..usable }.is_usable());
		assert!(!AccountFlags { expired: true, ..usable }.is_usable());
		assert!(!AccountFlags { credentials_expired: true, ..usable }.is_usable());
	}
}
