//! Signed bearer tokens: key material, claims, and the HMAC-SHA256 codec.
//!
//! Tokens are compact JWS strings signed with HS256. [`TokenCodec::issue`] mints them and
//! [`TokenCodec::verify`] checks, in order, structure, algorithm, signature, required claims,
//! expiry (exclusive), and issuer.

pub mod claims;
pub mod codec;
pub mod key;

pub use claims::*;
pub use codec::*;
pub use key::*;
