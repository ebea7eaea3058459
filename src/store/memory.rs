//! Thread-safe in-memory [`CredentialStore`] implementation.

// self
use crate::{
	_prelude::*,
	auth::IdentityId,
	credential::{CredentialUpdate, ExternalCredential},
	store::{CredentialStore, StoreFuture},
};

type CredentialMap = Arc<RwLock<HashMap<IdentityId, ExternalCredential>>>;

/// Storage backend that keeps credentials in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryCredentialStore(CredentialMap);
impl MemoryCredentialStore {
	/// Number of stored credentials.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when no credential is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	fn get_now(map: &CredentialMap, identity: &IdentityId) -> Option<ExternalCredential> {
		map.read().get(identity).cloned()
	}

	fn upsert_now(
		map: &CredentialMap,
		identity: &IdentityId,
		update: CredentialUpdate,
		now: OffsetDateTime,
	) -> ExternalCredential {
		let mut guard = map.write();
		let credential = update.apply(identity, guard.get(identity), now);

		guard.insert(identity.to_owned(), credential.clone());

		credential
	}

	fn update_existing_now(
		map: &CredentialMap,
		identity: &IdentityId,
		created_at: OffsetDateTime,
		update: CredentialUpdate,
		now: OffsetDateTime,
	) -> Option<ExternalCredential> {
		let mut guard = map.write();
		let current = guard.get(identity).filter(|current| current.created_at == created_at)?;
		let credential = update.apply(identity, Some(current), now);

		guard.insert(identity.to_owned(), credential.clone());

		Some(credential)
	}

	fn delete_now(map: &CredentialMap, identity: &IdentityId) -> bool {
		map.write().remove(identity).is_some()
	}
}
impl CredentialStore for MemoryCredentialStore {
	fn get<'a>(
		&'a self,
		identity: &'a IdentityId,
	) -> StoreFuture<'a, Option<ExternalCredential>> {
		Box::pin(async move { Ok(Self::get_now(&self.0, identity)) })
	}

	fn upsert<'a>(
		&'a self,
		identity: &'a IdentityId,
		update: CredentialUpdate,
	) -> StoreFuture<'a, ExternalCredential> {
		Box::pin(
			async move { Ok(Self::upsert_now(&self.0, identity, update, OffsetDateTime::now_utc())) },
		)
	}

	fn update_existing<'a>(
		&'a self,
		identity: &'a IdentityId,
		created_at: OffsetDateTime,
		update: CredentialUpdate,
	) -> StoreFuture<'a, Option<ExternalCredential>> {
		Box::pin(async move {
			Ok(Self::update_existing_now(
				&self.0,
				identity,
				created_at,
				update,
				OffsetDateTime::now_utc(),
			))
		})
	}

	fn delete<'a>(&'a self, identity: &'a IdentityId) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(Self::delete_now(&self.0, identity)) })
	}
}
