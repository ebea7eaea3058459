//! Authorization-code exchange that connects an identity to the provider.

// self
use crate::{
	_prelude::*,
	auth::IdentityId,
	credential::ExternalCredential,
	flows::CredentialManager,
	http::TokenHttpClient,
	oauth::BasicFacade,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C> CredentialManager<C>
where
	C: TokenHttpClient,
{
	/// Exchanges an authorization `code` and stores the resulting credential for `identity`.
	///
	/// `redirect_uri` must match the one used to obtain the code. Nothing is stored when the
	/// exchange fails.
	pub async fn connect(
		&self,
		identity: &IdentityId,
		code: &str,
		redirect_uri: &Url,
	) -> Result<ExternalCredential> {
		const KIND: FlowKind = FlowKind::Connect;

		let span = FlowSpan::new(KIND, "connect");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let facade = <BasicFacade<C>>::from_descriptor(
					&self.descriptor,
					&self.client_id,
					self.client_secret(),
					self.http_client.clone(),
				)?;
				let grant = facade
					.exchange_authorization_code(code, redirect_uri)
					.await
					.map_err(Error::ExchangeFailed)?;
				let expires_at = OffsetDateTime::now_utc() + grant.expires_in;

				self.store(identity, grant.access_token, grant.refresh_token, Some(expires_at)).await
			})
			.await;

		match &result {
			Ok(_) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Success);
				tracing::info!(identity = %identity, "External credential connected.");
			},
			Err(e) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				tracing::warn!(identity = %identity, error = %e, "Authorization code exchange failed.");
			},
		}

		result
	}
}
