//! HMAC signing key material.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::Rng;
// self
use crate::{_prelude::*, error::ConfigError};

/// Shortest accepted HMAC-SHA256 key, in bits.
pub const MIN_KEY_BITS: usize = 256;

/// Symmetric signing key shared by issuance and verification.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(Vec<u8>);
impl SigningKey {
	/// Decodes a standard base64 key and enforces [`MIN_KEY_BITS`].
	pub fn from_base64(encoded: &str) -> Result<Self, ConfigError> {
		let bytes = STANDARD
			.decode(encoded.trim())
			.map_err(|source| ConfigError::SigningKeyEncoding { source })?;

		Self::from_bytes(bytes)
	}

	/// Wraps raw key bytes and enforces [`MIN_KEY_BITS`].
	pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
		let bytes = bytes.into();
		let bits = bytes.len() * 8;

		if bits < MIN_KEY_BITS {
			return Err(ConfigError::WeakSigningKey { bits, required: MIN_KEY_BITS });
		}

		Ok(Self(bytes))
	}

	/// Generates a random key of exactly [`MIN_KEY_BITS`].
	pub fn generate() -> Self {
		let mut bytes = [0_u8; MIN_KEY_BITS / 8];

		rand::rng().fill(&mut bytes);

		Self(bytes.to_vec())
	}

	/// Returns the key as standard base64, suitable for configuration files.
	pub fn to_base64(&self) -> String {
		STANDARD.encode(&self.0)
	}

	pub(crate) fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}
impl Debug for SigningKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SigningKey").field(&"<redacted>").finish()
	}
}
