//! Token administration routes mounted under `/tokens`.

// crates.io
use axum::{
	Json, Router,
	extract::{Path, Query, State},
	http::StatusCode,
	routing::{get, post},
};
// self
use crate::{
	_prelude::*,
	error::{Rejection, VerifyError},
	revocation::TokenId,
	server::{AdminPrincipal, ApiError, GuardState, Principal},
};

/// Status of a token as reported by `GET /tokens/check`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TokenStatus {
	/// The token decoded; `valid` is `false` when it is revoked or expired.
	Decoded {
		/// Signed by this service, unexpired, and not revoked.
		valid: bool,
		/// Present in the revocation registry.
		blacklisted: bool,
		/// Expiry instant.
		#[serde(rename = "expiresAt", with = "time::serde::rfc3339")]
		expires_at: OffsetDateTime,
		/// Seconds until expiry, clamped at zero.
		#[serde(rename = "expiresInSeconds")]
		expires_in_seconds: i64,
	},
	/// The token could not be verified.
	Undecodable {
		/// Always `false`.
		valid: bool,
		/// Present in the revocation registry.
		blacklisted: bool,
		/// Stable error code.
		error: String,
	},
}

/// Query of `GET /tokens/check`.
#[derive(Clone, Debug, Deserialize)]
pub struct CheckQuery {
	/// Token to inspect.
	pub token: String,
}

/// Body of `GET /tokens/blacklist/size`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrySize {
	/// Number of registry entries.
	pub size: usize,
}

/// Builds the `/tokens` routes.
///
/// The routes read the [`crate::authenticator::AuthContext`] bound by
/// [`crate::server::authenticate`], so the returned router must sit behind that middleware.
pub fn admin_router(state: GuardState) -> Router {
	Router::new()
		.route("/tokens/revoke", post(revoke_current))
		.route("/tokens/revoke/{token}", post(revoke_token))
		.route("/tokens/check", get(check_token))
		.route("/tokens/blacklist/size", get(registry_size))
		.with_state(state)
}

async fn revoke_current(
	State(state): State<GuardState>,
	Principal(context): Principal,
) -> Result<StatusCode, ApiError> {
	state
		.authenticator
		.registry()
		.revoke(&context.token_id, context.expires_at())
		.await
		.map_err(internal)?;

	tracing::info!(token = %context.token_id, expires_at = %context.expires_at(), "Token revoked by its holder.");

	Ok(StatusCode::OK)
}

async fn revoke_token(
	State(state): State<GuardState>,
	AdminPrincipal(admin): AdminPrincipal,
	Path(token): Path<String>,
) -> Result<StatusCode, ApiError> {
	let token_id = TokenId::of(&token);
	let expires_at = match state.authenticator.codec().verify(&token) {
		Ok(claims) => claims.expires_at,
		Err(VerifyError::Expired { .. }) => {
			tracing::debug!(token = %token_id, "Expired token needs no revocation.");

			return Ok(StatusCode::OK);
		},
		Err(e) => {
			tracing::info!(token = %token_id, error = %e, "Administrative revocation refused.");

			return Err(ApiError::BadToken);
		},
	};

	state.authenticator.registry().revoke(&token_id, expires_at).await.map_err(internal)?;

	tracing::info!(
		admin = %admin.identity.id,
		token = %token_id,
		expires_at = %expires_at,
		"Token revoked by an administrator."
	);

	Ok(StatusCode::OK)
}

async fn check_token(
	State(state): State<GuardState>,
	Query(query): Query<CheckQuery>,
) -> Result<Json<TokenStatus>, ApiError> {
	let token_id = TokenId::of(&query.token);
	let blacklisted = state.authenticator.registry().is_revoked(&token_id).await.map_err(internal)?;
	let now = OffsetDateTime::now_utc();
	let (verified, expires_at) = match state.authenticator.codec().verify_at(&query.token, now) {
		Ok(claims) => (true, claims.expires_at),
		Err(VerifyError::Expired { expired_at }) => (false, expired_at),
		Err(e) => {
			tracing::debug!(token = %token_id, error = %e, "Checked token is undecodable.");

			return Ok(Json(TokenStatus::Undecodable {
				valid: false,
				blacklisted,
				error: Rejection::InvalidCredential.code().into(),
			}));
		},
	};

	Ok(Json(TokenStatus::Decoded {
		valid: verified && !blacklisted,
		blacklisted,
		expires_at,
		expires_in_seconds: (expires_at - now).whole_seconds().max(0),
	}))
}

async fn registry_size(
	State(state): State<GuardState>,
	AdminPrincipal(_): AdminPrincipal,
) -> Result<Json<RegistrySize>, ApiError> {
	let size = state.authenticator.registry().size().await.map_err(internal)?;

	Ok(Json(RegistrySize { size }))
}

fn internal(err: impl Display) -> ApiError {
	tracing::error!(error = %err, "Revocation registry failed.");

	ApiError::Internal
}
