//! Request authentication middleware and principal extractors.

// crates.io
use axum::{
	body::Body,
	extract::{FromRequestParts, State},
	http::{HeaderValue, Request, header::AUTHORIZATION, request::Parts},
	middleware::Next,
	response::{IntoResponse, Response},
};
// self
use crate::{
	_prelude::*,
	authenticator::AuthContext,
	server::{ApiError, GuardState, RATE_LIMIT_REMAINING},
};

/// Authenticates the request and binds an [`AuthContext`] to its extensions.
///
/// Anonymous requests pass through without a context; routes that need one use [`Principal`]
/// or [`AdminPrincipal`]. Denied requests never reach the inner service.
pub async fn authenticate(
	State(state): State<GuardState>,
	mut req: Request<Body>,
	next: Next,
) -> Response {
	// A context bound by an outer layer must not survive a failed or anonymous check.
	req.extensions_mut().remove::<AuthContext>();

	let path = req.uri().path().to_owned();
	let authorization = req.headers().get(AUTHORIZATION).cloned();
	let outcome = state.authenticator.authenticate(&path, authorization.as_ref()).await;
	let admission = match outcome {
		Ok(admission) => admission,
		Err(denial) => return ApiError::from(denial).into_response(),
	};

	if let Some(context) = admission.context {
		req.extensions_mut().insert(context);
	}

	let mut response = next.run(req).await;

	response.headers_mut().insert(RATE_LIMIT_REMAINING, HeaderValue::from(admission.remaining));

	response
}

/// Authenticated caller; rejects anonymous requests with 401.
#[derive(Clone, Debug)]
pub struct Principal(pub AuthContext);
impl<S> FromRequestParts<S> for Principal
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, _: &S) -> Result<Self, Self::Rejection> {
		parts.extensions.get::<AuthContext>().cloned().map(Self).ok_or(ApiError::Unauthenticated)
	}
}

/// Authenticated caller holding `ROLE_ADMIN`; rejects others with 401 or 403.
#[derive(Clone, Debug)]
pub struct AdminPrincipal(pub AuthContext);
impl<S> FromRequestParts<S> for AdminPrincipal
where
	S: Send + Sync,
{
	type Rejection = ApiError;

	async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
		let Principal(context) = Principal::from_request_parts(parts, state).await?;

		if !context.is_admin() {
			tracing::info!(identity = %context.identity.id, "Administrative route refused.");

			return Err(ApiError::Forbidden);
		}

		Ok(Self(context))
	}
}
