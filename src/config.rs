//! Startup configuration and component construction.
//!
//! [`GuardConfig`] is read from JSON. Every misconfiguration is reported as a [`ConfigError`]
//! before any component starts, and the builders below turn a validated tree into the
//! codec, admission bucket, authenticator, and credential manager.

// self
use crate::{
	_prelude::*,
	admission::{BucketConfig, TokenBucket},
	auth::{IdentityStore, ProviderId, TokenSecret},
	authenticator::{Authenticator, ExemptPaths},
	error::ConfigError,
	flows::ReqwestCredentialManager,
	http::ReqwestHttpClient,
	provider::{ClientAuthMethod, ProviderDescriptor},
	revocation::{RevocationRegistry, RevocationSweeper},
	store::CredentialStore,
	token::{SigningKey, TokenCodec},
};

/// Root configuration tree.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GuardConfig {
	/// Token signing settings.
	pub jwt: JwtConfig,
	/// Global admission bucket.
	#[serde(default)]
	pub rate_limit: RateLimitConfig,
	/// Revocation registry housekeeping.
	#[serde(default)]
	pub revocation: RevocationConfig,
	/// Paths that skip credential processing.
	#[serde(default)]
	pub exempt_paths: ExemptPaths,
	/// External OAuth provider, when credential management is enabled.
	#[serde(default)]
	pub provider: Option<ProviderConfig>,
}
impl GuardConfig {
	/// Parses and validates a JSON document.
	pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
		let deserializer = &mut serde_json::Deserializer::from_str(json);
		let config: Self = serde_path_to_error::deserialize(deserializer)
			.map_err(|source| ConfigError::Parse { source })?;

		config.validate()?;

		Ok(config)
	}

	/// Checks every section without starting anything.
	pub fn validate(&self) -> Result<(), ConfigError> {
		self.jwt.codec()?;
		self.rate_limit.bucket_config()?;
		self.revocation.sweep_interval()?;

		if let Some(provider) = &self.provider {
			provider.descriptor()?;
		}

		Ok(())
	}

	/// Builds the request authenticator around the given registry and identity store.
	pub fn authenticator(
		&self,
		registry: Arc<dyn RevocationRegistry>,
		identities: Arc<dyn IdentityStore>,
	) -> Result<Authenticator, ConfigError> {
		let codec = Arc::new(self.jwt.codec()?);
		let bucket = Arc::new(TokenBucket::new(self.rate_limit.bucket_config()?));

		Ok(Authenticator::new(bucket, registry, codec, identities)
			.with_exempt_paths(self.exempt_paths.clone()))
	}

	/// Builds the credential manager for the configured provider.
	pub fn credential_manager(
		&self,
		store: Arc<dyn CredentialStore>,
	) -> Result<ReqwestCredentialManager, ConfigError> {
		self.provider.as_ref().ok_or(ConfigError::MissingProvider)?.credential_manager(store)
	}
}

/// Signed-token settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JwtConfig {
	/// Base64-encoded HMAC key of at least 256 bits.
	pub secret: TokenSecret,
	/// Expected and minted `iss` claim.
	#[serde(default = "JwtConfig::default_issuer")]
	pub issuer: String,
	/// Lifetime of issued tokens, in seconds.
	#[serde(default = "JwtConfig::default_ttl_secs")]
	pub ttl_secs: u64,
}
impl JwtConfig {
	const DEFAULT_ISSUER: &'static str = "bearer-guard";

	fn default_issuer() -> String {
		Self::DEFAULT_ISSUER.into()
	}

	fn default_ttl_secs() -> u64 {
		86_400
	}

	/// Decodes the signing key.
	pub fn signing_key(&self) -> Result<SigningKey, ConfigError> {
		SigningKey::from_base64(self.secret.expose())
	}

	/// Builds the token codec.
	pub fn codec(&self) -> Result<TokenCodec, ConfigError> {
		let ttl = i64::try_from(self.ttl_secs).map_err(|_| ConfigError::TtlTooLong {
			max_days: TokenCodec::MAX_TTL.whole_days(),
		})?;

		TokenCodec::new(&self.signing_key()?, self.issuer.as_str(), Duration::seconds(ttl))
	}
}

/// Admission bucket settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateLimitConfig {
	/// Bucket capacity.
	pub capacity: u64,
	/// Tokens added per interval.
	pub refill_tokens: u64,
	/// Refill interval, in seconds.
	pub refill_interval_secs: u64,
}
impl RateLimitConfig {
	/// Validated bucket parameters.
	pub fn bucket_config(&self) -> Result<BucketConfig, ConfigError> {
		BucketConfig::new(
			self.capacity,
			self.refill_tokens,
			StdDuration::from_secs(self.refill_interval_secs),
		)
	}
}
impl Default for RateLimitConfig {
	fn default() -> Self {
		let defaults = BucketConfig::default();

		Self {
			capacity: defaults.capacity(),
			refill_tokens: defaults.refill_tokens(),
			refill_interval_secs: defaults.refill_interval().as_secs(),
		}
	}
}

/// Revocation registry settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RevocationConfig {
	/// Period of the background sweep, in seconds.
	pub sweep_interval_secs: u64,
}
impl RevocationConfig {
	/// Validated sweep period.
	pub fn sweep_interval(&self) -> Result<StdDuration, ConfigError> {
		let period = StdDuration::from_secs(self.sweep_interval_secs);

		RevocationSweeper::check_period(period)?;

		Ok(period)
	}
}
impl Default for RevocationConfig {
	fn default() -> Self {
		Self { sweep_interval_secs: RevocationSweeper::DEFAULT_PERIOD.as_secs() }
	}
}

/// External OAuth provider settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
	/// Provider identifier.
	pub id: ProviderId,
	/// Endpoint users are redirected to for consent.
	pub authorization_endpoint: Url,
	/// Endpoint serving code exchanges and refreshes.
	pub token_endpoint: Url,
	/// OAuth client identifier.
	pub client_id: String,
	/// OAuth client secret.
	pub client_secret: TokenSecret,
	/// Client authentication at the token endpoint.
	#[serde(default)]
	pub client_auth: ClientAuthMethod,
	/// Connect timeout, in seconds.
	#[serde(default = "ProviderConfig::default_connect_timeout_secs")]
	pub connect_timeout_secs: u64,
	/// Overall request timeout, in seconds.
	#[serde(default = "ProviderConfig::default_request_timeout_secs")]
	pub request_timeout_secs: u64,
}
impl ProviderConfig {
	fn default_connect_timeout_secs() -> u64 {
		ReqwestHttpClient::DEFAULT_CONNECT_TIMEOUT.as_secs()
	}

	fn default_request_timeout_secs() -> u64 {
		ReqwestHttpClient::DEFAULT_REQUEST_TIMEOUT.as_secs()
	}

	/// Validated provider descriptor.
	pub fn descriptor(&self) -> Result<ProviderDescriptor, ConfigError> {
		Ok(ProviderDescriptor::builder(self.id.clone())
			.authorization_endpoint(self.authorization_endpoint.clone())
			.token_endpoint(self.token_endpoint.clone())
			.client_auth_method(self.client_auth)
			.build()?)
	}

	/// Transport honoring the configured timeouts.
	pub fn http_client(&self) -> Result<ReqwestHttpClient, ConfigError> {
		ReqwestHttpClient::with_timeouts(
			StdDuration::from_secs(self.connect_timeout_secs),
			StdDuration::from_secs(self.request_timeout_secs),
		)
	}

	/// Builds a credential manager backed by `store`.
	pub fn credential_manager(
		&self,
		store: Arc<dyn CredentialStore>,
	) -> Result<ReqwestCredentialManager, ConfigError> {
		Ok(ReqwestCredentialManager::with_http_client(
			store,
			self.descriptor()?,
			self.client_id.as_str(),
			self.client_secret.clone(),
			self.http_client()?,
		))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{authenticator::ExemptPath, store::MemoryCredentialStore};

	fn minimal() -> String {
		format!(r#"{{ "jwt": {{ "secret": "{}" }} }}"#, SigningKey::generate().to_base64())
	}

	#[test]
	fn minimal_document_uses_reference_defaults() {
		let config = GuardConfig::from_json_str(&minimal()).expect("Minimal config should load.");

		assert_eq!(config.jwt.issuer, "bearer-guard");
		assert_eq!(config.jwt.ttl_secs, 86_400);
		assert_eq!(config.rate_limit, RateLimitConfig::default());
		assert_eq!(
			config.rate_limit.bucket_config().expect("Default bucket should be valid."),
			BucketConfig::default()
		);
		assert_eq!(config.revocation.sweep_interval_secs, 3_600);
		assert!(config.exempt_paths.is_exempt("/api/auth/login"));
		assert!(config.provider.is_none());
		assert!(matches!(
			config.credential_manager(Arc::new(MemoryCredentialStore::default())),
			Err(ConfigError::MissingProvider)
		));
	}

	#[test]
	fn parse_errors_carry_the_offending_path() {
		let err = GuardConfig::from_json_str(r#"{ "jwt": { "secret": "a", "ttl_secs": "soon" } }"#)
			.expect_err("A string TTL should be rejected.");

		match err {
			ConfigError::Parse { source } => assert_eq!(source.path().to_string(), "jwt.ttl_secs"),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn weak_keys_and_zero_parameters_fail_at_startup() {
		let weak = r#"{ "jwt": { "secret": "c2hvcnQ=" } }"#;

		assert!(matches!(
			GuardConfig::from_json_str(weak),
			Err(ConfigError::WeakSigningKey { bits: 40, required: 256 })
		));

		let key = SigningKey::generate().to_base64();
		let zero_capacity =
			format!(r#"{{ "jwt": {{ "secret": "{key}" }}, "rate_limit": {{ "capacity": 0 }} }}"#);

		assert!(matches!(
			GuardConfig::from_json_str(&zero_capacity),
			Err(ConfigError::InvalidRateLimit { field: "capacity" })
		));

		let zero_sweep = format!(
			r#"{{ "jwt": {{ "secret": "{key}" }}, "revocation": {{ "sweep_interval_secs": 0 }} }}"#
		);

		assert!(matches!(
			GuardConfig::from_json_str(&zero_sweep),
			Err(ConfigError::InvalidSweepInterval)
		));

		let empty_issuer = format!(r#"{{ "jwt": {{ "secret": "{key}", "issuer": "" }} }}"#);

		assert!(matches!(GuardConfig::from_json_str(&empty_issuer), Err(ConfigError::EmptyIssuer)));
	}

	#[test]
	fn oversized_values_fail_at_startup() {
		let key = SigningKey::generate().to_base64();
		let huge_ttl = format!(r#"{{ "jwt": {{ "secret": "{key}", "ttl_secs": {} }} }}"#, u64::MAX);

		assert!(matches!(
			GuardConfig::from_json_str(&huge_ttl),
			Err(ConfigError::TtlTooLong { max_days: 365 })
		));

		let long_ttl =
			format!(r#"{{ "jwt": {{ "secret": "{key}", "ttl_secs": {} }} }}"#, 400 * 86_400);

		assert!(matches!(
			GuardConfig::from_json_str(&long_ttl),
			Err(ConfigError::TtlTooLong { .. })
		));

		let huge_interval = format!(
			r#"{{ "jwt": {{ "secret": "{key}" }}, "rate_limit": {{ "refill_interval_secs": {} }} }}"#,
			u64::MAX
		);

		assert!(matches!(
			GuardConfig::from_json_str(&huge_interval),
			Err(ConfigError::InvalidRateLimit { field: "refill_interval" })
		));

		let huge_sweep = format!(
			r#"{{ "jwt": {{ "secret": "{key}" }}, "revocation": {{ "sweep_interval_secs": {} }} }}"#,
			u64::MAX
		);

		assert!(matches!(
			GuardConfig::from_json_str(&huge_sweep),
			Err(ConfigError::InvalidSweepInterval)
		));
	}

	#[test]
	fn provider_section_builds_a_manager() {
		let key = SigningKey::generate().to_base64();
		let json = format!(
			r#"{{
				"jwt": {{ "secret": "{key}" }},
				"exempt_paths": [{{ "exact": "/health" }}],
				"provider": {{
					"id": "figma",
					"authorization_endpoint": "https://www.figma.com/oauth",
					"token_endpoint": "https://api.figma.com/v1/oauth/token",
					"client_id": "client",
					"client_secret": "secret",
					"client_auth": "client_secret_post"
				}}
			}}"#
		);
		let config = GuardConfig::from_json_str(&json).expect("Provider config should load.");

		assert_eq!(config.exempt_paths, ExemptPaths::new([ExemptPath::exact("/health")]));

		let provider = config.provider.as_ref().expect("Provider section should be present.");

		assert_eq!(provider.connect_timeout_secs, 5);
		assert_eq!(provider.request_timeout_secs, 10);

		let manager = config
			.credential_manager(Arc::new(MemoryCredentialStore::default()))
			.expect("Manager should build.");

		assert_eq!(manager.descriptor.client_auth_method, ClientAuthMethod::ClientSecretPost);
		assert_eq!(manager.client_id, "client");
	}

	#[test]
	fn insecure_provider_endpoints_are_rejected() {
		let key = SigningKey::generate().to_base64();
		let json = format!(
			r#"{{
				"jwt": {{ "secret": "{key}" }},
				"provider": {{
					"id": "figma",
					"authorization_endpoint": "http://www.figma.com/oauth",
					"token_endpoint": "https://api.figma.com/v1/oauth/token",
					"client_id": "client",
					"client_secret": "secret"
				}}
			}}"#
		);

		assert!(matches!(GuardConfig::from_json_str(&json), Err(ConfigError::Provider(_))));
	}
}
