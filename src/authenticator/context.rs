//! Authentication bound to an admitted request.

// self
use crate::{_prelude::*, auth::Identity, revocation::TokenId, token::Claims};

/// Authentication bound to a request after every check passed.
#[derive(Clone, Debug)]
pub struct AuthContext {
	/// Resolved identity, including authorities and account flags.
	pub identity: Identity,
	/// Verified claims of the presented token.
	pub claims: Claims,
	/// Fingerprint of the presented token.
	pub token_id: TokenId,
}
impl AuthContext {
	/// Returns `true` when the bound identity holds `authority`.
	pub fn has_authority(&self, authority: &str) -> bool {
		self.identity.has_authority(authority)
	}

	/// Returns `true` when the bound identity is an administrator.
	pub fn is_admin(&self) -> bool {
		self.identity.is_admin()
	}

	/// Expiry of the presented token.
	pub fn expires_at(&self) -> OffsetDateTime {
		self.claims.expires_at
	}
}
