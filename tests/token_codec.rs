// crates.io
use time::{Duration, OffsetDateTime, macros::datetime};
// self
use bearer_guard::{
	error::{ConfigError, VerifyError},
	token::{ExtraClaims, SigningKey, TokenCodec},
};

fn codec(issuer: &str) -> TokenCodec {
	TokenCodec::new(&SigningKey::generate(), issuer, TokenCodec::DEFAULT_TTL)
		.expect("Codec fixture should build.")
}

#[test]
fn issued_tokens_verify_with_their_claims() {
	let codec = codec("bearer-guard");
	let now = datetime!(2025-11-10 12:00 UTC);
	let mut extra = ExtraClaims::new();

	extra.insert("role".into(), "ROLE_ADMIN".into());
	extra.insert("exp".into(), 0.into());

	let issued = codec
		.issue_at("ada@example.com", "bearer-guard", extra, Duration::hours(1), now)
		.expect("Issuing should succeed.");
	let claims = codec
		.verify_at(&issued.token, now + Duration::minutes(59))
		.expect("A live token should verify.");

	assert_eq!(claims.subject, "ada@example.com");
	assert_eq!(claims.issuer, "bearer-guard");
	assert_eq!(claims.issued_at, now);
	assert_eq!(claims.expires_at, now + Duration::hours(1));
	assert_eq!(claims.extra.get("role").and_then(|value| value.as_str()), Some("ROLE_ADMIN"));
	assert!(claims.jti.is_some());
}

#[test]
fn expiry_is_exclusive() {
	let codec = codec("bearer-guard");
	let now = datetime!(2025-11-10 12:00 UTC);
	let issued = codec
		.issue_at("ada@example.com", "bearer-guard", ExtraClaims::new(), Duration::seconds(1), now)
		.expect("Issuing should succeed.");

	assert!(codec.verify_at(&issued.token, now).is_ok());
	assert_eq!(
		codec.verify_at(&issued.token, now + Duration::seconds(1)),
		Err(VerifyError::Expired { expired_at: now + Duration::seconds(1) })
	);
}

#[test]
fn tampered_payloads_fail_the_signature_check() {
	let codec = codec("bearer-guard");
	let issued = codec.issue_for("ada@example.com").expect("Issuing should succeed.");
	let mut segments: Vec<String> = issued.token.split('.').map(str::to_owned).collect();
	let forged = codec.issue_for("eve@example.com").expect("Issuing should succeed.");

	segments[1] = forged.token.split('.').nth(1).expect("Token should have a payload.").to_owned();

	assert_eq!(codec.verify(&segments.join(".")), Err(VerifyError::BadSignature));
}

#[test]
fn tokens_from_another_key_are_rejected() {
	let issuer = codec("bearer-guard");
	let verifier = codec("bearer-guard");
	let issued = issuer.issue_for("ada@example.com").expect("Issuing should succeed.");

	assert_eq!(verifier.verify(&issued.token), Err(VerifyError::BadSignature));
}

#[test]
fn issuer_is_checked_after_the_signature() {
	let key = SigningKey::generate();
	let minted = TokenCodec::new(&key, "someone-else", TokenCodec::DEFAULT_TTL)
		.expect("Codec fixture should build.");
	let expected = TokenCodec::new(&key, "bearer-guard", TokenCodec::DEFAULT_TTL)
		.expect("Codec fixture should build.");
	let issued = minted.issue_for("ada@example.com").expect("Issuing should succeed.");

	assert_eq!(
		expected.verify(&issued.token),
		Err(VerifyError::IssuerMismatch {
			expected: "bearer-guard".into(),
			found: "someone-else".into(),
		})
	);
}

#[test]
fn structural_garbage_is_classified() {
	let codec = codec("bearer-guard");

	assert!(matches!(codec.verify("not-a-token"), Err(VerifyError::Malformed { .. })));
	assert!(matches!(codec.verify("a.b.c.d.e"), Err(VerifyError::UnsupportedFormat { .. })));
	// {"alg":"none","typ":"JWT"}
	assert!(matches!(
		codec.verify("eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.e30."),
		Err(VerifyError::UnsupportedFormat { .. })
	));
}

#[test]
fn weak_keys_and_bad_lifetimes_are_configuration_errors() {
	assert!(matches!(
		SigningKey::from_bytes(vec![7_u8; 31]),
		Err(ConfigError::WeakSigningKey { bits: 248, required: 256 })
	));
	assert!(matches!(
		TokenCodec::new(&SigningKey::generate(), "bearer-guard", Duration::ZERO),
		Err(ConfigError::NonPositiveTtl)
	));
	assert!(matches!(
		TokenCodec::new(&SigningKey::generate(), "bearer-guard", Duration::days(10_000_000)),
		Err(ConfigError::TtlTooLong { max_days: 365 })
	));
	assert!(
		TokenCodec::new(&SigningKey::generate(), "bearer-guard", TokenCodec::MAX_TTL).is_ok()
	);

	let codec = codec("bearer-guard");

	assert!(matches!(
		codec.issue("ada@example.com", "bearer-guard", ExtraClaims::new(), Duration::weeks(60)),
		Err(ConfigError::TtlTooLong { .. })
	));

	assert!(matches!(
		codec.issue("ada@example.com", "bearer-guard", ExtraClaims::new(), Duration::milliseconds(500)),
		Err(ConfigError::NonPositiveTtl)
	));
	assert!(matches!(
		codec.issue_at(
			"ada@example.com",
			"",
			ExtraClaims::new(),
			Duration::hours(1),
			OffsetDateTime::now_utc()
		),
		Err(ConfigError::EmptyIssuer)
	));
}
