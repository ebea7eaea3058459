//! Storage contracts and the built-in in-memory credential store.

pub mod memory;

pub use memory::MemoryCredentialStore;

// self
use crate::{
	_prelude::*,
	auth::IdentityId,
	credential::{CredentialUpdate, ExternalCredential},
};

/// Boxed future returned by every storage contract in the crate.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Repository contract for external credentials, one per identity.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the credential stored for `identity`, if present.
	fn get<'a>(&'a self, identity: &'a IdentityId)
	-> StoreFuture<'a, Option<ExternalCredential>>;

	/// Atomically creates or replaces the credential for `identity`.
	///
	/// Every field of the update replaces the stored one in a single step; only `created_at`
	/// survives a replacement. Readers never observe a partially written credential.
	fn upsert<'a>(
		&'a self,
		identity: &'a IdentityId,
		update: CredentialUpdate,
	) -> StoreFuture<'a, ExternalCredential>;

	/// Replaces the credential for `identity` only while the stored one was created at
	/// `created_at`.
	///
	/// Returns `None` without writing when the credential is gone or was recreated in between.
	fn update_existing<'a>(
		&'a self,
		identity: &'a IdentityId,
		created_at: OffsetDateTime,
		update: CredentialUpdate,
	) -> StoreFuture<'a, Option<ExternalCredential>>;

	/// Removes the credential for `identity`, returning whether one existed.
	fn delete<'a>(&'a self, identity: &'a IdentityId) -> StoreFuture<'a, bool>;
}

/// Error type produced by storage implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
