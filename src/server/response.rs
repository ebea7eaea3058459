//! Structured error responses.

// crates.io
use axum::{
	Json,
	http::{HeaderMap, HeaderValue, StatusCode, header::WWW_AUTHENTICATE},
	response::{IntoResponse, Response},
};
// self
use crate::{
	_prelude::*,
	authenticator::Denial,
	error::Rejection,
	server::{RATE_LIMIT_REMAINING, RATE_LIMIT_RETRY_AFTER, TOKEN_BLACKLISTED},
};

/// JSON body of every error response.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
	/// Stable machine-readable code.
	pub code: String,
	/// Human-readable message without internal detail.
	pub message: String,
}

/// Errors produced by the middleware, the extractors, and the administration routes.
#[derive(Debug, ThisError)]
pub enum ApiError {
	/// The authenticator refused the request.
	#[error("{}", .0.rejection)]
	Denied(Denial),
	/// The route needs an authenticated caller.
	#[error("Authentication is required.")]
	Unauthenticated,
	/// The caller lacks the required authority.
	#[error("Missing required authority.")]
	Forbidden,
	/// A token passed as a parameter failed verification.
	#[error("Token is invalid.")]
	BadToken,
	/// A backing store failed.
	#[error("Internal error.")]
	Internal,
}
impl ApiError {
	/// HTTP status of the response.
	pub fn status(&self) -> StatusCode {
		match self {
			ApiError::Denied(denial) => StatusCode::from_u16(denial.rejection.http_status())
				.unwrap_or(StatusCode::UNAUTHORIZED),
			ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
			ApiError::Forbidden => StatusCode::FORBIDDEN,
			ApiError::BadToken => StatusCode::BAD_REQUEST,
			ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}

	/// Stable code placed in [`ErrorBody::code`].
	pub fn code(&self) -> &'static str {
		match self {
			ApiError::Denied(denial) => denial.rejection.code(),
			ApiError::Unauthenticated | ApiError::BadToken => Rejection::InvalidCredential.code(),
			ApiError::Forbidden => "Forbidden",
			ApiError::Internal => "Internal",
		}
	}

	fn headers(&self) -> HeaderMap {
		let mut headers = HeaderMap::new();

		if self.status() == StatusCode::UNAUTHORIZED {
			headers.insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
		}

		let ApiError::Denied(denial) = self else {
			return headers;
		};

		headers.insert(RATE_LIMIT_REMAINING, HeaderValue::from(denial.remaining));

		match &denial.rejection {
			Rejection::RateLimited { retry_after } => {
				headers.insert(RATE_LIMIT_RETRY_AFTER, HeaderValue::from(retry_after_secs(*retry_after)));
			},
			Rejection::Revoked => {
				headers.insert(TOKEN_BLACKLISTED, HeaderValue::from_static("true"));
			},
			_ => (),
		}

		headers
	}
}
impl From<Denial> for ApiError {
	fn from(denial: Denial) -> Self {
		Self::Denied(denial)
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { code: self.code().into(), message: self.to_string() };

		(self.status(), self.headers(), Json(body)).into_response()
	}
}

/// Rounds up so clients never retry before a token is available.
pub(crate) fn retry_after_secs(retry_after: StdDuration) -> u64 {
	retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0)
}
