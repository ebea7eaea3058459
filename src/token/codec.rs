//! HS256 issue and verification of bearer tokens.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
	Algorithm, DecodingKey, EncodingKey, Header, Validation, errors::ErrorKind,
};
// self
use crate::{
	_prelude::*,
	error::{ConfigError, VerifyError},
	token::{Claims, ExtraClaims, IssuedToken, REGISTERED_CLAIMS, RawClaims, SigningKey},
};

/// Issues and verifies HS256-signed bearer tokens for a single issuer.
#[derive(Clone)]
pub struct TokenCodec {
	encoding: EncodingKey,
	decoding: DecodingKey,
	validation: Validation,
	issuer: String,
	default_ttl: Duration,
}
impl TokenCodec {
	/// Lifetime applied by [`TokenCodec::issue_for`] unless overridden.
	pub const DEFAULT_TTL: Duration = Duration::days(1);
	/// Longest lifetime the codec issues tokens for.
	pub const MAX_TTL: Duration = Duration::days(365);

	/// Creates a codec bound to `issuer`.
	pub fn new(
		key: &SigningKey,
		issuer: impl Into<String>,
		default_ttl: Duration,
	) -> Result<Self, ConfigError> {
		let issuer = issuer.into();

		if issuer.is_empty() {
			return Err(ConfigError::EmptyIssuer);
		}

		validate_ttl(default_ttl)?;

		let mut validation = Validation::new(Algorithm::HS256);

		// Expiry and issuer are checked by hand so each failure keeps its own kind.
		validation.leeway = 0;
		validation.validate_exp = false;
		validation.validate_nbf = false;
		validation.validate_aud = false;
		validation.required_spec_claims.clear();

		Ok(Self {
			encoding: EncodingKey::from_secret(key.as_bytes()),
			decoding: DecodingKey::from_secret(key.as_bytes()),
			validation,
			issuer,
			default_ttl,
		})
	}

	/// Issuer this codec mints tokens for and accepts tokens from.
	pub fn issuer(&self) -> &str {
		&self.issuer
	}

	/// Lifetime applied by [`TokenCodec::issue_for`].
	pub fn default_ttl(&self) -> Duration {
		self.default_ttl
	}

	/// Issues a token for `subject` with the configured issuer and default lifetime.
	pub fn issue_for(&self, subject: &str) -> Result<IssuedToken, ConfigError> {
		self.issue(subject, &self.issuer, ExtraClaims::new(), self.default_ttl)
	}

	/// Issues a token expiring `ttl` from now.
	///
	/// Extra claims named like a registered claim are dropped.
	pub fn issue(
		&self,
		subject: &str,
		issuer: &str,
		extra: ExtraClaims,
		ttl: Duration,
	) -> Result<IssuedToken, ConfigError> {
		self.issue_at(subject, issuer, extra, ttl, OffsetDateTime::now_utc())
	}

	/// Deterministic twin of [`TokenCodec::issue`].
	pub fn issue_at(
		&self,
		subject: &str,
		issuer: &str,
		mut extra: ExtraClaims,
		ttl: Duration,
		now: OffsetDateTime,
	) -> Result<IssuedToken, ConfigError> {
		if issuer.is_empty() {
			return Err(ConfigError::EmptyIssuer);
		}

		validate_ttl(ttl)?;

		for name in REGISTERED_CLAIMS {
			extra.remove(name);
		}

		let iat = now.unix_timestamp();
		let raw = RawClaims {
			sub: subject.to_owned(),
			iss: issuer.to_owned(),
			iat,
			exp: iat.saturating_add(ttl.whole_seconds()),
			jti: Some(new_jti()),
			extra,
		};
		let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &raw, &self.encoding)
			.map_err(|source| ConfigError::TokenEncoding { source })?;
		let claims = Claims::try_from(raw).map_err(|_| ConfigError::TtlTooLong {
			max_days: Self::MAX_TTL.whole_days(),
		})?;

		Ok(IssuedToken { token, claims })
	}

	/// Verifies `token` against the current clock.
	pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
		self.verify_at(token, OffsetDateTime::now_utc())
	}

	/// Deterministic twin of [`TokenCodec::verify`].
	pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, VerifyError> {
		check_format(token)?;

		let data = jsonwebtoken::decode::<RawClaims>(token, &self.decoding, &self.validation)
			.map_err(map_decode_error)?;
		let raw = data.claims;

		if now.unix_timestamp() >= raw.exp {
			let expired_at = OffsetDateTime::from_unix_timestamp(raw.exp)
				.unwrap_or(OffsetDateTime::UNIX_EPOCH);

			return Err(VerifyError::Expired { expired_at });
		}
		if raw.iss != self.issuer {
			return Err(VerifyError::IssuerMismatch {
				expected: self.issuer.clone(),
				found: raw.iss,
			});
		}

		Claims::try_from(raw).map_err(|_| VerifyError::malformed("timestamp out of range"))
	}
}
impl Debug for TokenCodec {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenCodec")
			.field("issuer", &self.issuer)
			.field("default_ttl", &self.default_ttl)
			.finish_non_exhaustive()
	}
}

fn validate_ttl(ttl: Duration) -> Result<(), ConfigError> {
	if ttl < Duration::SECOND {
		return Err(ConfigError::NonPositiveTtl);
	}
	if ttl > TokenCodec::MAX_TTL {
		return Err(ConfigError::TtlTooLong { max_days: TokenCodec::MAX_TTL.whole_days() });
	}

	Ok(())
}

fn new_jti() -> String {
	URL_SAFE_NO_PAD.encode(rand::random::<u128>().to_be_bytes())
}

fn check_format(token: &str) -> Result<(), VerifyError> {
	let segments = token.split('.').collect::<Vec<_>>();

	match segments.len() {
		3 => (),
		5 => return Err(VerifyError::unsupported("encrypted tokens are not accepted")),
		_ => return Err(VerifyError::malformed("expected three segments")),
	}

	let header = URL_SAFE_NO_PAD
		.decode(segments[0])
		.map_err(|_| VerifyError::malformed("header is not base64url"))?;
	let header = serde_json::from_slice::<serde_json::Value>(&header)
		.map_err(|_| VerifyError::malformed("header is not JSON"))?;
	let alg = header
		.get("alg")
		.and_then(serde_json::Value::as_str)
		.ok_or_else(|| VerifyError::malformed("header has no algorithm"))?;

	if alg != "HS256" {
		return Err(VerifyError::unsupported(format!("algorithm `{alg}`")));
	}
	if segments[2].is_empty() {
		return Err(VerifyError::unsupported("unsigned token"));
	}

	Ok(())
}

fn map_decode_error(err: jsonwebtoken::errors::Error) -> VerifyError {
	match err.kind() {
		ErrorKind::InvalidSignature => VerifyError::BadSignature,
		ErrorKind::InvalidAlgorithm => VerifyError::unsupported("algorithm mismatch"),
		_ => VerifyError::malformed(err.to_string()),
	}
}
