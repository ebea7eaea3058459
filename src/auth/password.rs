//! Argon2id hashing of identity passwords.

// crates.io
use argon2::{
	Argon2,
	password_hash::{
		self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng,
	},
};
// self
use crate::auth::TokenSecret;

/// Hashes `password` into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<TokenSecret, password_hash::Error> {
	let salt = SaltString::generate(&mut OsRng);
	let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;

	Ok(TokenSecret::new(hash.to_string()))
}

/// Returns `true` when `password` matches the stored PHC `hash`.
///
/// An unparsable hash never matches.
pub fn verify_password(password: &str, hash: &TokenSecret) -> bool {
	match PasswordHash::new(hash.expose()) {
		Ok(parsed) => Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok(),
		Err(e) => {
			tracing::warn!(error = %e, "Stored password hash is not a PHC string.");

			false
		},
	}
}
