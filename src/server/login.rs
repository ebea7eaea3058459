//! Password sign-in route.

// crates.io
use axum::{Json, Router, extract::State, routing::post};
// self
use crate::{
	_prelude::*,
	server::{ApiError, GuardState},
};

/// Body of `POST /auth/login`.
#[derive(Clone, Deserialize)]
pub struct LoginRequest {
	/// Identity e-mail.
	pub email: String,
	/// Plain-text password.
	pub password: String,
}
impl Debug for LoginRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Successful sign-in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
	/// Freshly issued bearer token.
	pub token: String,
	/// Identity the token was issued for.
	pub email: String,
	/// Expiry instant of the token.
	#[serde(rename = "expiresAt", with = "time::serde::rfc3339")]
	pub expires_at: OffsetDateTime,
}

/// Builds the `/auth/login` route.
///
/// Nest it under an exempt prefix (the defaults exempt `/api/auth/`) so callers without a
/// token can reach it.
pub fn login_router(state: GuardState) -> Router {
	Router::new().route("/auth/login", post(login)).with_state(state)
}

async fn login(
	State(state): State<GuardState>,
	Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
	let issued = state
		.authenticator
		.login(&request.email, &request.password)
		.await
		.map_err(|_| ApiError::Unauthenticated)?;

	Ok(Json(LoginResponse {
		email: issued.claims.subject,
		expires_at: issued.claims.expires_at,
		token: issued.token,
	}))
}
