//! Guard-level error types shared across the codec, authenticator, registry, and credential flows.

// self
use crate::{_prelude::*, provider::GrantType};

/// Guard-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

pub(crate) type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Signed token failed verification.
	#[error(transparent)]
	Verify(#[from] VerifyError),
	/// Request was refused by the authenticator.
	#[error(transparent)]
	Rejected(#[from] Rejection),
	/// Refreshing an external credential failed; the stored credential is unchanged.
	#[error("Refresh failed: {0}")]
	RefreshFailed(#[source] ExchangeFailure),
	/// Authorization-code exchange failed; nothing was stored.
	#[error("Code exchange failed: {0}")]
	ExchangeFailed(#[source] ExchangeFailure),
}

/// Configuration and validation failures. All of them are fatal at startup.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Configuration document could not be parsed.
	#[error("Configuration is invalid at `{}`.", .source.path())]
	Parse {
		/// Structured parsing failure with the offending path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Signing key is not valid base64.
	#[error("Signing key is not valid base64.")]
	SigningKeyEncoding {
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// Signing key is shorter than the HMAC-SHA256 minimum.
	#[error("Signing key carries {bits} bits; at least {required} are required.")]
	WeakSigningKey {
		/// Decoded key strength.
		bits: usize,
		/// Minimum accepted key strength.
		required: usize,
	},
	/// Issuer string is empty.
	#[error("Token issuer cannot be empty.")]
	EmptyIssuer,
	/// Token lifetime is shorter than one second.
	#[error("Token lifetime must be at least one second.")]
	NonPositiveTtl,
	/// Token lifetime exceeds the supported maximum.
	#[error("Token lifetime must not exceed {max_days} days.")]
	TtlTooLong {
		/// Longest accepted lifetime, in days.
		max_days: i64,
	},
	/// Admission bucket parameter is zero or out of range.
	#[error("Rate limit `{field}` is zero or out of range.")]
	InvalidRateLimit {
		/// Offending parameter name.
		field: &'static str,
	},
	/// Sweep period is zero or longer than one week.
	#[error("Revocation sweep interval must be between one second and one week.")]
	InvalidSweepInterval,
	/// Token could not be serialized or signed.
	#[error("Token could not be encoded.")]
	TokenEncoding {
		/// Underlying codec failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Provider descriptor failed validation.
	#[error(transparent)]
	Provider(#[from] crate::provider::ProviderDescriptorError),
	/// Identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] crate::auth::IdentifierError),
	/// Credential manager was requested without a provider section.
	#[error("No provider is configured.")]
	MissingProvider,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Reasons a signed token fails verification.
///
/// These kinds are logged but never surfaced to HTTP clients, which only ever see
/// [`Rejection::InvalidCredential`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum VerifyError {
	/// The token reached its expiry instant.
	#[error("Token expired at {expired_at}.")]
	Expired {
		/// Expiry instant carried by the token.
		expired_at: OffsetDateTime,
	},
	/// The signature does not match the payload under the configured key.
	#[error("Token signature does not match.")]
	BadSignature,
	/// The token is structurally invalid or lacks required claims.
	#[error("Token is malformed: {reason}.")]
	Malformed {
		/// Short description of the structural problem.
		reason: String,
	},
	/// The token was minted by a different issuer.
	#[error("Token issuer `{found}` does not match `{expected}`.")]
	IssuerMismatch {
		/// Issuer configured on the codec.
		expected: String,
		/// Issuer found in the token.
		found: String,
	},
	/// The token is encrypted, unsigned, or signed with another algorithm.
	#[error("Token format is not supported: {reason}.")]
	UnsupportedFormat {
		/// Short description of the unsupported shape.
		reason: String,
	},
}
impl VerifyError {
	pub(crate) fn malformed(reason: impl Into<String>) -> Self {
		Self::Malformed { reason: reason.into() }
	}

	pub(crate) fn unsupported(reason: impl Into<String>) -> Self {
		Self::UnsupportedFormat { reason: reason.into() }
	}
}

/// Client-visible reasons the authenticator refused a request.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum Rejection {
	/// The global admission bucket is empty.
	#[error("Rate limit exceeded; retry after {} seconds.", .retry_after.as_secs())]
	RateLimited {
		/// Time until the next token becomes available.
		retry_after: StdDuration,
	},
	/// The presented token is on the revocation list.
	#[error("Token has been revoked.")]
	Revoked,
	/// The bearer credential failed verification or could not be processed.
	#[error("Bearer credential is invalid.")]
	InvalidCredential,
	/// The token subject does not resolve to a known identity.
	#[error("Token subject is not a known identity.")]
	UnknownIdentity,
}
impl Rejection {
	/// Stable machine-readable code for response bodies and metrics.
	pub const fn code(&self) -> &'static str {
		match self {
			Rejection::RateLimited { .. } => "RateLimited",
			Rejection::Revoked => "Revoked",
			Rejection::InvalidCredential => "InvalidCredential",
			Rejection::UnknownIdentity => "UnknownIdentity",
		}
	}

	/// HTTP status the rejection maps to.
	pub const fn http_status(&self) -> u16 {
		match self {
			Rejection::RateLimited { .. } => 429,
			_ => 401,
		}
	}
}

/// Failure of a token-endpoint exchange against the external provider.
#[derive(Debug, ThisError)]
#[error("The {grant} exchange failed: {kind}.")]
pub struct ExchangeFailure {
	/// Grant that was attempted.
	pub grant: GrantType,
	/// Classified failure kind.
	pub kind: ExchangeFailureKind,
	/// Underlying transport or parsing failure, when one exists.
	#[source]
	pub source: Option<BoxError>,
}
impl ExchangeFailure {
	/// Creates a failure without an underlying source.
	pub fn new(grant: GrantType, kind: ExchangeFailureKind) -> Self {
		Self { grant, kind, source: None }
	}

	/// Attaches the underlying failure.
	pub fn with_source(mut self, src: impl 'static + Send + Sync + StdError) -> Self {
		self.source = Some(Box::new(src));

		self
	}
}

/// Classification of [`ExchangeFailure`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ExchangeFailureKind {
	/// No credential is stored for the identity.
	#[error("no credential is stored for the identity")]
	NoCredential,
	/// The stored credential carries no refresh token.
	#[error("the stored credential has no refresh token")]
	MissingRefreshToken,
	/// Network, TLS, or IO failure.
	#[error("transport error while calling the token endpoint")]
	Transport,
	/// Connect or read timeout elapsed.
	#[error("request to the token endpoint timed out")]
	Timeout,
	/// Non-success status without a parsable OAuth error body.
	#[error("token endpoint answered with HTTP {status}")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// Provider answered with an OAuth error body.
	#[error("provider rejected the grant with `{error}`")]
	Rejected {
		/// OAuth `error` code.
		error: String,
		/// HTTP status code, when captured.
		status: Option<u16>,
	},
	/// Success status but the body is unusable.
	#[error("token endpoint response is invalid: {reason}")]
	InvalidResponse {
		/// Short description of the problem.
		reason: String,
	},
	/// The background exchange task stopped before finishing.
	#[error("exchange task was interrupted")]
	Interrupted,
	/// The credential was removed or replaced while the exchange was in flight.
	#[error("the credential was disconnected during the exchange")]
	Disconnected,
}
