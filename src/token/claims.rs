//! Registered and extra claims carried by issued tokens.

// self
use crate::_prelude::*;

/// Free-form claims carried next to the registered ones.
pub type ExtraClaims = serde_json::Map<String, serde_json::Value>;

/// Registered claim names that extra claims may never override.
pub const REGISTERED_CLAIMS: [&str; 7] = ["sub", "iss", "iat", "exp", "jti", "nbf", "aud"];

/// Wire representation of the token payload.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct RawClaims {
	pub(crate) sub: String,
	pub(crate) iss: String,
	pub(crate) iat: i64,
	pub(crate) exp: i64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub(crate) jti: Option<String>,
	#[serde(flatten)]
	pub(crate) extra: ExtraClaims,
}

/// Claims of a successfully verified (or freshly issued) token.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
	/// Subject; resolved against the identity store.
	pub subject: String,
	/// Issuer that minted the token.
	pub issuer: String,
	/// Issue instant (second precision).
	pub issued_at: OffsetDateTime,
	/// Expiry instant (second precision, exclusive).
	pub expires_at: OffsetDateTime,
	/// Unique token identifier, when present.
	pub jti: Option<String>,
	/// Additional claims.
	pub extra: ExtraClaims,
}
impl Claims {
	/// Remaining lifetime at `now`, clamped at zero.
	pub fn remaining_at(&self, now: OffsetDateTime) -> Duration {
		let remaining = self.expires_at - now;

		if remaining.is_negative() { Duration::ZERO } else { remaining }
	}
}
impl TryFrom<RawClaims> for Claims {
	type Error = time::error::ComponentRange;

	fn try_from(raw: RawClaims) -> Result<Self, Self::Error> {
		Ok(Self {
			subject: raw.sub,
			issuer: raw.iss,
			issued_at: OffsetDateTime::from_unix_timestamp(raw.iat)?,
			expires_at: OffsetDateTime::from_unix_timestamp(raw.exp)?,
			jti: raw.jti,
			extra: raw.extra,
		})
	}
}

/// Token string paired with the claims it carries.
#[derive(Clone, Debug)]
pub struct IssuedToken {
	/// Compact serialized token.
	pub token: String,
	/// Claims embedded in the token.
	pub claims: Claims,
}
