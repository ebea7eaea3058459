//! OAuth client facade performing the provider's token-endpoint grants.

pub use oauth2;

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ConfigError, ExchangeFailure, ExchangeFailureKind},
	http::{ResponseMetadata, ResponseMetadataSlot, TokenHttpClient},
	provider::{ClientAuthMethod, GrantType, ProviderDescriptor},
};

/// Lifetime assumed when the provider omits `expires_in`.
pub const DEFAULT_EXPIRES_IN: Duration = Duration::hours(1);

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ExchangeFailure>> + 'a + Send>>;

/// Tokens returned by a successful grant.
#[derive(Clone, Debug)]
pub struct TokenGrant {
	/// New access token.
	pub access_token: TokenSecret,
	/// New refresh token, when the provider rotated it.
	pub refresh_token: Option<TokenSecret>,
	/// Lifetime of the access token.
	pub expires_in: Duration,
}

pub(crate) struct BasicFacade<C>
where
	C: TokenHttpClient,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
}
impl<C> BasicFacade<C>
where
	C: TokenHttpClient,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client_id: &str,
		client_secret: &TokenSecret,
		http_client: Arc<C>,
	) -> Result<Self, ConfigError> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(client_id.to_owned()))
			.set_client_secret(ClientSecret::new(client_secret.expose().to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if matches!(descriptor.client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client })
	}

	pub(crate) fn refresh_token<'a>(&'a self, refresh_token: &'a str) -> FacadeFuture<'a, TokenGrant> {
		const GRANT: GrantType = GrantType::RefreshToken;

		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.to_owned());
			let response = self
				.oauth_client
				.exchange_refresh_token(&refresh_secret)
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error::<C>(GRANT, meta.take(), err))?;

			map_token_response(GRANT, response)
		})
	}

	pub(crate) fn exchange_authorization_code<'a>(
		&'a self,
		code: &'a str,
		redirect_uri: &'a Url,
	) -> FacadeFuture<'a, TokenGrant> {
		const GRANT: GrantType = GrantType::AuthorizationCode;

		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let redirect_url = RedirectUrl::new(redirect_uri.to_string()).map_err(|source| {
				ExchangeFailure::new(
					GRANT,
					ExchangeFailureKind::InvalidResponse { reason: "redirect URI is invalid".into() },
				)
				.with_source(source)
			})?;
			let response = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.set_redirect_uri(Cow::Owned(redirect_url))
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error::<C>(GRANT, meta.take(), err))?;

			map_token_response(GRANT, response)
		})
	}
}

fn map_token_response(
	grant: GrantType,
	response: BasicTokenResponse,
) -> Result<TokenGrant, ExchangeFailure> {
	let invalid = |reason: &str| {
		ExchangeFailure::new(grant, ExchangeFailureKind::InvalidResponse { reason: reason.into() })
	};
	let expires_in = match response.expires_in() {
		Some(lifetime) => {
			let secs = i64::try_from(lifetime.as_secs())
				.map_err(|_| invalid("expires_in exceeds the supported range"))?;

			if secs <= 0 {
				return Err(invalid("expires_in must be positive"));
			}

			Duration::seconds(secs)
		},
		None => DEFAULT_EXPIRES_IN,
	};

	Ok(TokenGrant {
		access_token: TokenSecret::new(response.access_token().secret()),
		refresh_token: response.refresh_token().map(|token| TokenSecret::new(token.secret())),
		expires_in,
	})
}

fn map_request_error<C>(
	grant: GrantType,
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<C::TransportError>>,
) -> ExchangeFailure
where
	C: TokenHttpClient,
{
	let status = meta.and_then(|value| value.status);
	let unexpected = |reason: String| match status {
		Some(code) if !(200..300).contains(&code) =>
			ExchangeFailure::new(grant, ExchangeFailureKind::Status { status: code }),
		_ => ExchangeFailure::new(grant, ExchangeFailureKind::InvalidResponse { reason }),
	};

	match err {
		RequestTokenError::ServerResponse(response) => ExchangeFailure::new(
			grant,
			ExchangeFailureKind::Rejected { error: response.error().as_ref().to_owned(), status },
		),
		RequestTokenError::Request(HttpClientError::Reqwest(inner)) => {
			let kind = if C::is_timeout(&inner) {
				ExchangeFailureKind::Timeout
			} else {
				ExchangeFailureKind::Transport
			};

			ExchangeFailure::new(grant, kind).with_source(*inner)
		},
		RequestTokenError::Request(other) =>
			ExchangeFailure::new(grant, ExchangeFailureKind::Transport).with_source(other),
		RequestTokenError::Parse(source, _body) =>
			unexpected(format!("unexpected body at `{}`", source.path())).with_source(source),
		RequestTokenError::Other(message) => unexpected(message),
	}
}
