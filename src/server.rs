//! axum integration: the authentication middleware, principal extractors, the password
//! sign-in route, and the token administration routes.
//!
//! ```ignore
//! let state = GuardState::new(authenticator);
//! let app = server::protect(api_routes.merge(server::admin_router(state.clone())), state);
//! ```

pub mod admin;
pub mod login;
pub mod middleware;
pub mod response;

pub use admin::*;
pub use login::*;
pub use middleware::*;
pub use response::*;

// crates.io
use axum::{Router, http::HeaderName};
// self
use crate::{_prelude::*, authenticator::Authenticator};

/// Tokens left in the admission bucket, sent on every admitted or denied response.
pub const RATE_LIMIT_REMAINING: HeaderName = HeaderName::from_static("x-rate-limit-remaining");
/// Whole seconds until admission resumes, sent with 429 responses.
pub const RATE_LIMIT_RETRY_AFTER: HeaderName =
	HeaderName::from_static("x-rate-limit-retry-after-seconds");
/// Set to `true` when the presented token has been revoked.
pub const TOKEN_BLACKLISTED: HeaderName = HeaderName::from_static("x-token-blacklisted");

/// Shared state of the middleware and the administration routes.
#[derive(Clone, Debug)]
pub struct GuardState {
	/// Request authenticator.
	pub authenticator: Arc<Authenticator>,
}
impl GuardState {
	/// Wraps `authenticator` for sharing across requests.
	pub fn new(authenticator: Authenticator) -> Self {
		Self { authenticator: Arc::new(authenticator) }
	}
}

/// Runs [`authenticate`] in front of every route of `router`.
pub fn protect<S>(router: Router<S>, state: GuardState) -> Router<S>
where
	S: 'static + Clone + Send + Sync,
{
	router.layer(axum::middleware::from_fn_with_state(state, authenticate))
}
