//! Revocation registry: a set of revoked token fingerprints, each carrying the token's own expiry.
//!
//! An entry answers "revoked" only while its expiry lies in the future. Dead entries are removed
//! lazily by [`RevocationRegistry::is_revoked`] and periodically by [`RevocationSweeper`].

pub mod memory;
pub mod sweeper;

pub use memory::MemoryRevocationRegistry;
pub use sweeper::{RevocationSweeper, SweeperHandle};

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, store::StoreFuture};

/// SHA-256 fingerprint of a token's exact serialized string.
///
/// Registries key on the fingerprint so raw bearer tokens never sit in memory or logs longer
/// than the request that carried them.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(String);
impl TokenId {
	/// Fingerprints `token`.
	pub fn of(token: &str) -> Self {
		let digest = Sha256::digest(token.as_bytes());

		Self(URL_SAFE_NO_PAD.encode(digest))
	}

	/// Returns the base64url fingerprint.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for TokenId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "TokenId({})", self.0)
	}
}
impl Display for TokenId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Storage contract for revoked tokens.
pub trait RevocationRegistry
where
	Self: Send + Sync,
{
	/// Revokes `token` until `expires_at`; a no-op when `expires_at` is not in the future.
	fn revoke<'a>(&'a self, token: &'a TokenId, expires_at: OffsetDateTime)
	-> StoreFuture<'a, ()>;

	/// Returns `true` while a live entry exists for `token`.
	///
	/// Entries found dead are removed on the way out.
	fn is_revoked<'a>(&'a self, token: &'a TokenId) -> StoreFuture<'a, bool>;

	/// Removes the entry for `token`, returning whether one existed.
	fn unrevoke<'a>(&'a self, token: &'a TokenId) -> StoreFuture<'a, bool>;

	/// Removes every dead entry, returning how many were dropped.
	fn sweep(&self) -> StoreFuture<'_, usize>;

	/// Point-in-time entry count, possibly including dead entries not yet swept.
	fn size(&self) -> StoreFuture<'_, usize>;
}
