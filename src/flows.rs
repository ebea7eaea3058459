//! Lifecycle management for credentials minted by the external OAuth provider.
//!
//! [`CredentialManager`] owns the provider descriptor, the confidential client, and the
//! credential store. It connects identities through the authorization-code grant, hands out
//! live access tokens (refreshing stale ones on demand), and disconnects identities again.

pub mod connect;
pub mod refresh;

pub use refresh::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{IdentityId, TokenSecret},
	credential::{self, CredentialUpdate, ExternalCredential},
	error::ConfigError,
	http::{ReqwestHttpClient, TokenHttpClient},
	provider::ProviderDescriptor,
	store::CredentialStore,
};

/// Manager specialized for the crate's default reqwest transport.
pub type ReqwestCredentialManager = CredentialManager<ReqwestHttpClient>;

/// Coordinates external credentials for a single provider.
pub struct CredentialManager<C = ReqwestHttpClient>
where
	C: TokenHttpClient,
{
	/// HTTP client used for every token-endpoint call.
	pub http_client: Arc<C>,
	/// Credential persistence.
	pub store: Arc<dyn CredentialStore>,
	/// Provider endpoints and client authentication mode.
	pub descriptor: ProviderDescriptor,
	/// OAuth client identifier.
	pub client_id: String,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	client_secret: TokenSecret,
	serialize_refreshes: bool,
	flow_guards: Arc<Mutex<HashMap<IdentityId, Arc<AsyncMutex<()>>>>>,
}
impl<C> CredentialManager<C>
where
	C: TokenHttpClient,
{
	/// Creates a manager that reuses the caller-provided transport.
	pub fn with_http_client(
		store: Arc<dyn CredentialStore>,
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		client_secret: impl Into<TokenSecret>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			store,
			descriptor,
			client_id: client_id.into(),
			refresh_metrics: Default::default(),
			client_secret: client_secret.into(),
			serialize_refreshes: false,
			flow_guards: Default::default(),
		}
	}

	/// Serializes concurrent refreshes of the same identity.
	///
	/// When enabled, a caller that waited on another caller's refresh re-reads the store and
	/// reuses the fresh credential instead of calling the provider again.
	pub fn with_serialized_refreshes(mut self, enabled: bool) -> Self {
		self.serialize_refreshes = enabled;

		self
	}

	/// Stores (or replaces) the credential of `identity` in one step.
	pub async fn store(
		&self,
		identity: &IdentityId,
		access_token: impl Into<TokenSecret>,
		refresh_token: Option<TokenSecret>,
		expires_at: Option<OffsetDateTime>,
	) -> Result<ExternalCredential> {
		let update = CredentialUpdate::new(access_token)
			.with_refresh_token(refresh_token)
			.with_expires_at(expires_at);
		let stored = self.store.upsert(identity, update).await?;

		tracing::debug!(identity = %identity, expires_at = ?stored.expires_at, "External credential stored.");

		Ok(stored)
	}

	/// Returns the stored credential of `identity`, if any.
	pub async fn credential(&self, identity: &IdentityId) -> Result<Option<ExternalCredential>> {
		Ok(self.store.get(identity).await?)
	}

	/// Returns `true` when `credential` must be refreshed before use.
	pub fn is_stale(&self, credential: Option<&ExternalCredential>) -> bool {
		credential::is_stale(credential)
	}

	/// Removes the credential of `identity`; returns whether one existed.
	pub async fn disconnect(&self, identity: &IdentityId) -> Result<bool> {
		let removed = self.store.delete(identity).await?;

		self.prune_flow_guard(identity);
		tracing::info!(identity = %identity, removed, "External credential disconnected.");

		Ok(removed)
	}

	/// Builds the provider URL that starts the authorization-code grant.
	pub fn authorization_url(&self, redirect_uri: &Url, scope: &str, state: &str) -> Url {
		self.descriptor.authorization_url(&self.client_id, redirect_uri, scope, state)
	}

	pub(crate) fn client_secret(&self) -> &TokenSecret {
		&self.client_secret
	}

	pub(crate) fn flow_guard(&self, identity: &IdentityId) -> Arc<AsyncMutex<()>> {
		let mut guards = self.flow_guards.lock();

		guards.entry(identity.to_owned()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	/// Drops the guard of `identity` once no caller holds or waits on it.
	pub(crate) fn prune_flow_guard(&self, identity: &IdentityId) {
		let mut guards = self.flow_guards.lock();

		if guards.get(identity).is_some_and(|guard| Arc::strong_count(guard) == 1) {
			guards.remove(identity);
		}
	}
}
impl CredentialManager<ReqwestHttpClient> {
	/// Creates a manager with its own reqwest transport using the default timeouts.
	pub fn new(
		store: Arc<dyn CredentialStore>,
		descriptor: ProviderDescriptor,
		client_id: impl Into<String>,
		client_secret: impl Into<TokenSecret>,
	) -> Result<Self, ConfigError> {
		Ok(Self::with_http_client(
			store,
			descriptor,
			client_id,
			client_secret,
			ReqwestHttpClient::new()?,
		))
	}
}
impl<C> Clone for CredentialManager<C>
where
	C: TokenHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			store: self.store.clone(),
			descriptor: self.descriptor.clone(),
			client_id: self.client_id.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			client_secret: self.client_secret.clone(),
			serialize_refreshes: self.serialize_refreshes,
			flow_guards: self.flow_guards.clone(),
		}
	}
}
impl<C> Debug for CredentialManager<C>
where
	C: TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialManager")
			.field("descriptor", &self.descriptor)
			.field("client_id", &self.client_id)
			.field("serialize_refreshes", &self.serialize_refreshes)
			.finish_non_exhaustive()
	}
}
