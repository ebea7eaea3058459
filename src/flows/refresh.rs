//! On-demand refresh of stale external credentials.
//!
//! [`CredentialManager::live_access_token`] returns the stored access token when it is still
//! fresh and otherwise performs a `grant_type=refresh_token` exchange. The exchange and the
//! write that follows run on a detached task, so a caller that stops waiting never leaves a
//! refreshed token unsaved. A failed exchange leaves the stored credential untouched.

mod metrics;

pub use metrics::RefreshMetrics;

// crates.io
use async_lock::MutexGuardArc;
// self
use crate::{
	_prelude::*,
	auth::{IdentityId, TokenSecret},
	credential::{CredentialUpdate, ExternalCredential},
	error::{ExchangeFailure, ExchangeFailureKind},
	flows::CredentialManager,
	http::TokenHttpClient,
	oauth::BasicFacade,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	provider::GrantType,
};

impl<C> CredentialManager<C>
where
	C: TokenHttpClient,
{
	/// Returns a usable access token for `identity`, refreshing it first when stale.
	///
	/// A fresh credential is returned without contacting the provider. Every failure to obtain
	/// a new token surfaces as [`Error::RefreshFailed`] and leaves the store unchanged.
	pub async fn live_access_token(&self, identity: &IdentityId) -> Result<TokenSecret> {
		let current = self.store.get(identity).await?;

		if let Some(token) = fresh_access_token(current.as_ref(), OffsetDateTime::now_utc()) {
			return Ok(token);
		}

		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "live_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.refresh_metrics.record_attempt();

		let result = span
			.instrument(async move {
				if !self.serialize_refreshes {
					return self.refresh_detached(identity, current, None).await;
				}

				let result = self.refresh_serialized(identity).await;

				self.prune_flow_guard(identity);

				result
			})
			.await;

		match &result {
			Ok(_) => {
				self.refresh_metrics.record_success();
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
			},
			Err(e) => {
				self.refresh_metrics.record_failure();
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				tracing::warn!(identity = %identity, error = %e, "External credential refresh failed.");
			},
		}

		result
	}

	async fn refresh_serialized(&self, identity: &IdentityId) -> Result<TokenSecret> {
		let guard = self.flow_guard(identity).lock_arc().await;
		// Another caller may have refreshed while this one waited.
		let current = self.store.get(identity).await?;

		match fresh_access_token(current.as_ref(), OffsetDateTime::now_utc()) {
			Some(token) => Ok(token),
			None => self.refresh_detached(identity, current, Some(guard)).await,
		}
	}

	async fn refresh_detached(
		&self,
		identity: &IdentityId,
		current: Option<ExternalCredential>,
		guard: Option<MutexGuardArc<()>>,
	) -> Result<TokenSecret> {
		let manager = self.clone();
		let identity = identity.to_owned();
		let task = tokio::spawn(async move {
			let _guard = guard;

			manager.refresh_and_persist(&identity, current).await
		});

		match task.await {
			Ok(result) => result.map(|credential| credential.access_token),
			Err(e) => Err(Error::RefreshFailed(
				ExchangeFailure::new(GrantType::RefreshToken, ExchangeFailureKind::Interrupted)
					.with_source(e),
			)),
		}
	}

	async fn refresh_and_persist(
		&self,
		identity: &IdentityId,
		current: Option<ExternalCredential>,
	) -> Result<ExternalCredential> {
		let fail = |kind| Error::RefreshFailed(ExchangeFailure::new(GrantType::RefreshToken, kind));
		let current = current.ok_or_else(|| fail(ExchangeFailureKind::NoCredential))?;
		let refresh_token = current
			.refresh_token
			.as_ref()
			.ok_or_else(|| fail(ExchangeFailureKind::MissingRefreshToken))?;
		let facade = <BasicFacade<C>>::from_descriptor(
			&self.descriptor,
			&self.client_id,
			self.client_secret(),
			self.http_client.clone(),
		)?;
		let grant =
			facade.refresh_token(refresh_token.expose()).await.map_err(Error::RefreshFailed)?;
		let expires_at = OffsetDateTime::now_utc() + grant.expires_in;
		// Providers that do not rotate refresh tokens omit them from the response.
		let update = CredentialUpdate::new(grant.access_token)
			.with_refresh_token(grant.refresh_token.or_else(|| current.refresh_token.clone()))
			.expires_at(expires_at);
		// A disconnect that raced the exchange wins; the new tokens are discarded.
		let updated = self
			.store
			.update_existing(identity, current.created_at, update)
			.await?
			.ok_or_else(|| fail(ExchangeFailureKind::Disconnected))?;

		tracing::info!(identity = %identity, expires_at = %expires_at, "External credential refreshed.");

		Ok(updated)
	}
}

fn fresh_access_token(
	credential: Option<&ExternalCredential>,
	now: OffsetDateTime,
) -> Option<TokenSecret> {
	credential.filter(|credential| !credential.is_stale_at(now)).map(|c| c.access_token.clone())
}
