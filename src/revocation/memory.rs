//! Thread-safe in-memory [`RevocationRegistry`].

// self
use crate::{
	_prelude::*,
	revocation::{RevocationRegistry, TokenId},
	store::StoreFuture,
};

type EntryMap = Arc<RwLock<HashMap<TokenId, OffsetDateTime>>>;

/// Registry that keeps revoked fingerprints in a lock-protected map.
///
/// Every critical section touches a single entry except [`MemoryRevocationRegistry::sweep_at`],
/// which holds the write lock for one `retain` pass over the (small) map.
#[derive(Clone, Debug, Default)]
pub struct MemoryRevocationRegistry(EntryMap);
impl MemoryRevocationRegistry {
	/// Deterministic twin of [`RevocationRegistry::revoke`].
	pub fn revoke_at(&self, token: &TokenId, expires_at: OffsetDateTime, now: OffsetDateTime) {
		if expires_at <= now {
			return;
		}

		self.0.write().insert(token.to_owned(), expires_at);
	}

	/// Deterministic twin of [`RevocationRegistry::is_revoked`].
	pub fn is_revoked_at(&self, token: &TokenId, now: OffsetDateTime) -> bool {
		let expires_at = match self.0.read().get(token) {
			Some(expires_at) => *expires_at,
			None => return false,
		};

		if expires_at > now {
			return true;
		}

		let mut guard = self.0.write();

		// Another caller may have swept or re-revoked the entry in between.
		if guard.get(token).is_some_and(|current| *current <= now) {
			guard.remove(token);
		}

		false
	}

	/// Deterministic twin of [`RevocationRegistry::sweep`].
	pub fn sweep_at(&self, now: OffsetDateTime) -> usize {
		let mut guard = self.0.write();
		let before = guard.len();

		guard.retain(|_, expires_at| *expires_at > now);

		before - guard.len()
	}

	/// Removes the entry for `token`.
	pub fn unrevoke_now(&self, token: &TokenId) -> bool {
		self.0.write().remove(token).is_some()
	}

	/// Current entry count.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when the registry holds no entries.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl RevocationRegistry for MemoryRevocationRegistry {
	fn revoke<'a>(
		&'a self,
		token: &'a TokenId,
		expires_at: OffsetDateTime,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			self.revoke_at(token, expires_at, OffsetDateTime::now_utc());

			Ok(())
		})
	}

	fn is_revoked<'a>(&'a self, token: &'a TokenId) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.is_revoked_at(token, OffsetDateTime::now_utc())) })
	}

	fn unrevoke<'a>(&'a self, token: &'a TokenId) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.unrevoke_now(token)) })
	}

	fn sweep(&self) -> StoreFuture<'_, usize> {
		Box::pin(async move { Ok(self.sweep_at(OffsetDateTime::now_utc())) })
	}

	fn size(&self) -> StoreFuture<'_, usize> {
		Box::pin(async move { Ok(self.len()) })
	}
}
