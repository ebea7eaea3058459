//! Per-request authentication state machine.
//!
//! Each request walks admission, bearer extraction, revocation check, signature verification,
//! and identity resolution, stopping at the first rejection. Verification failures of any kind
//! surface as [`Rejection::InvalidCredential`]; the precise reason is only logged.

pub mod context;
pub mod exempt;

pub use context::*;
pub use exempt::*;

// crates.io
use axum::http::HeaderValue;
// self
use crate::{
	_prelude::*,
	admission::AdmissionControl,
	auth::{self, IdentityStore},
	error::{Rejection, VerifyError},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	revocation::{RevocationRegistry, TokenId},
	token::{IssuedToken, TokenCodec},
};

/// Scheme prefix of the `Authorization` header value.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Request admitted; `context` is `None` for anonymous and exempt requests.
#[derive(Clone, Debug)]
pub struct Admission {
	/// Admission tokens left after this request.
	pub remaining: u64,
	/// Bound authentication, if a credential was presented.
	pub context: Option<AuthContext>,
}

/// Request refused.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Denial {
	/// Admission tokens left; zero when the bucket refused the request.
	pub remaining: u64,
	/// Client-visible reason.
	pub rejection: Rejection,
}

/// Orchestrates admission, revocation, verification, and identity resolution.
#[derive(Clone)]
pub struct Authenticator {
	admission: Arc<dyn AdmissionControl>,
	registry: Arc<dyn RevocationRegistry>,
	codec: Arc<TokenCodec>,
	identities: Arc<dyn IdentityStore>,
	exempt: ExemptPaths,
}
impl Authenticator {
	/// Creates an authenticator with the default exempt paths.
	pub fn new(
		admission: Arc<dyn AdmissionControl>,
		registry: Arc<dyn RevocationRegistry>,
		codec: Arc<TokenCodec>,
		identities: Arc<dyn IdentityStore>,
	) -> Self {
		Self { admission, registry, codec, identities, exempt: ExemptPaths::default() }
	}

	/// Replaces the exempt path allow-list.
	pub fn with_exempt_paths(mut self, exempt: ExemptPaths) -> Self {
		self.exempt = exempt;

		self
	}

	/// Codec used for verification.
	pub fn codec(&self) -> &Arc<TokenCodec> {
		&self.codec
	}

	/// Registry consulted for revoked tokens.
	pub fn registry(&self) -> &Arc<dyn RevocationRegistry> {
		&self.registry
	}

	/// Exempt path allow-list.
	pub fn exempt_paths(&self) -> &ExemptPaths {
		&self.exempt
	}

	/// Runs the full state machine for one request.
	///
	/// `authorization` is the raw `Authorization` header, if any. Dropping the returned future
	/// leaves no side effects behind besides the consumed admission token.
	pub async fn authenticate(
		&self,
		path: &str,
		authorization: Option<&HeaderValue>,
	) -> Result<Admission, Denial> {
		const KIND: FlowKind = FlowKind::Authentication;

		let span = FlowSpan::new(KIND, "authenticate");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.run(path, authorization)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(denial) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::record_rejection(&denial.rejection);
			},
		}

		result
	}

	/// Signs `email` in with `password` and issues a token for the identity.
	///
	/// Unknown identities, wrong passwords, and unusable accounts all fail with
	/// [`Rejection::InvalidCredential`]; only the log tells them apart.
	pub async fn login(&self, email: &str, password: &str) -> Result<IssuedToken, Rejection> {
		const KIND: FlowKind = FlowKind::Login;

		let span = FlowSpan::new(KIND, "login");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.sign_in(email, password)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(rejection) => {
				obs::record_flow_outcome(KIND, FlowOutcome::Failure);
				obs::record_rejection(rejection);
			},
		}

		result
	}

	async fn sign_in(&self, email: &str, password: &str) -> Result<IssuedToken, Rejection> {
		let identity = match self.identities.find_by_email(email).await {
			Ok(Some(identity)) => identity,
			Ok(None) => {
				tracing::info!("Sign-in for an unknown identity.");

				return Err(Rejection::InvalidCredential);
			},
			Err(e) => {
				tracing::warn!(error = %e, "Identity lookup failed.");

				return Err(Rejection::InvalidCredential);
			},
		};
		let password_matches = identity
			.password_hash
			.as_ref()
			.is_some_and(|hash| auth::verify_password(password, hash));

		if !password_matches {
			tracing::info!(identity = %identity.id, "Sign-in password rejected.");

			return Err(Rejection::InvalidCredential);
		}
		if !identity.flags.is_usable() {
			tracing::info!(identity = %identity.id, flags = ?identity.flags, "Sign-in refused for an unusable account.");

			return Err(Rejection::InvalidCredential);
		}

		let issued = self.codec.issue_for(identity.id.as_ref()).map_err(|e| {
			tracing::warn!(identity = %identity.id, error = %e, "Token issuance failed.");

			Rejection::InvalidCredential
		})?;

		tracing::info!(identity = %identity.id, expires_at = %issued.claims.expires_at, "Identity signed in.");

		Ok(issued)
	}

	async fn run(
		&self,
		path: &str,
		authorization: Option<&HeaderValue>,
	) -> Result<Admission, Denial> {
		let decision = self.admission.try_acquire();

		if !decision.granted {
			tracing::debug!(path, retry_after = ?decision.retry_after, "Admission refused.");

			return Err(Denial {
				remaining: 0,
				rejection: Rejection::RateLimited { retry_after: decision.retry_after },
			});
		}

		let remaining = decision.remaining;
		let deny = |rejection| Denial { remaining, rejection };

		if self.exempt.is_exempt(path) {
			return Ok(Admission { remaining, context: None });
		}

		let token = match extract_bearer(authorization) {
			Ok(Some(token)) => token,
			Ok(None) => return Ok(Admission { remaining, context: None }),
			Err(reason) => {
				tracing::debug!(path, reason, "Bearer credential could not be extracted.");

				return Err(deny(Rejection::InvalidCredential));
			},
		};
		let token_id = TokenId::of(token);

		match self.registry.is_revoked(&token_id).await {
			Ok(false) => (),
			Ok(true) => {
				tracing::info!(token = %token_id, "Revoked token presented.");

				return Err(deny(Rejection::Revoked));
			},
			Err(e) => {
				tracing::warn!(error = %e, "Revocation lookup failed.");

				return Err(deny(Rejection::InvalidCredential));
			},
		}

		let claims = match self.codec.verify(token) {
			Ok(claims) => claims,
			Err(e) => {
				log_verify_failure(&token_id, &e);

				return Err(deny(Rejection::InvalidCredential));
			},
		};
		let identity = match self.identities.find_by_email(&claims.subject).await {
			Ok(Some(identity)) => identity,
			Ok(None) => {
				tracing::info!(token = %token_id, "Token subject does not resolve to an identity.");

				return Err(deny(Rejection::UnknownIdentity));
			},
			Err(e) => {
				tracing::warn!(error = %e, "Identity lookup failed.");

				return Err(deny(Rejection::InvalidCredential));
			},
		};

		tracing::debug!(identity = %identity.id, "Request authenticated.");

		Ok(Admission { remaining, context: Some(AuthContext { identity, claims, token_id }) })
	}
}
impl Debug for Authenticator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Authenticator")
			.field("codec", &self.codec)
			.field("exempt", &self.exempt)
			.finish_non_exhaustive()
	}
}

/// Extracts the bearer token from an `Authorization` header value.
///
/// Missing headers and other schemes are anonymous (`Ok(None)`); unreadable values and empty
/// tokens are errors.
pub fn extract_bearer(authorization: Option<&HeaderValue>) -> Result<Option<&str>, &'static str> {
	let Some(value) = authorization else {
		return Ok(None);
	};
	let value = value.to_str().map_err(|_| "header is not visible ASCII")?;
	let Some(token) = value.strip_prefix(BEARER_PREFIX) else {
		return Ok(None);
	};
	let token = token.trim();

	if token.is_empty() {
		return Err("bearer token is empty");
	}

	Ok(Some(token))
}

fn log_verify_failure(token_id: &TokenId, err: &VerifyError) {
	match err {
		VerifyError::BadSignature =>
			tracing::warn!(token = %token_id, error = %err, "Token signature rejected."),
		_ => tracing::debug!(token = %token_id, error = %err, "Token verification failed."),
	}
}
