//! Gateway-level error taxonomy shared by the gate, the token client, and the proxy layer.
//!
//! The set is closed: callers can match every failure a protected call may end with. Being asked
//! to authorize is not represented here; it is a regular [`crate::flows::GateOutcome`].

// self
use crate::{_prelude::*, provider::GrantType};

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Maximum number of characters kept from upstream response bodies.
pub const BODY_PREVIEW_LIMIT: usize = 256;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem; never retried.
	#[error(transparent)]
	Config(#[from] ConfigError),

	/// The OAuth callback presented an unknown, expired, or already-used state.
	#[error("Sign-in link is unknown, expired, or was already used; please restart sign-in.")]
	StateMismatch,
	/// The provider redirected back with an `error` instead of a code.
	#[error("Provider denied the authorization request: {error}.")]
	AuthorizationDenied {
		/// OAuth `error` code reported on the redirect.
		error: String,
		/// Optional `error_description` reported on the redirect.
		description: Option<String>,
	},
	/// The token endpoint rejected an authorization code exchange.
	#[error("Authorization code exchange failed: {0}")]
	ExchangeFailed(#[source] TokenEndpointError),
	/// The token endpoint rejected a refresh; the session must sign in again.
	#[error("Token refresh failed: {0}")]
	RefreshFailed(#[source] TokenEndpointError),
	/// The proxied API request failed after authentication.
	#[error(transparent)]
	Downstream(#[from] DownstreamError),
}
impl Error {
	/// Wraps a token endpoint failure according to the grant that produced it.
	pub fn token_endpoint(grant: GrantType, failure: TokenEndpointError) -> Self {
		match grant {
			GrantType::AuthorizationCode => Self::ExchangeFailed(failure),
			GrantType::RefreshToken => Self::RefreshFailed(failure),
		}
	}
}

/// Configuration and validation failures raised while wiring the gateway.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required setting was not supplied.
	#[error("Missing required setting `{name}`.")]
	Missing {
		/// Setting name as exposed on the command line.
		name: &'static str,
	},
	/// The authorization request has no scopes.
	#[error("At least one OAuth scope must be requested.")]
	EmptyScopes,
	/// An endpoint could not be parsed.
	#[error("The {name} URL is invalid.")]
	InvalidUrl {
		/// Which URL failed to parse.
		name: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// An endpoint uses plain HTTP on a non-loopback host.
	#[error("The {name} URL must use HTTPS: {url}.")]
	InsecureUrl {
		/// Which URL failed validation.
		name: &'static str,
		/// Offending URL.
		url: String,
	},
	/// An endpoint cannot carry path segments (e.g. `mailto:`).
	#[error("The {name} URL cannot be used as a base: {url}.")]
	CannotBeBase {
		/// Which URL failed validation.
		name: &'static str,
		/// Offending URL.
		url: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A session identifier failed validation.
	#[error(transparent)]
	InvalidIdentifier(#[from] crate::auth::IdentifierError),
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Coarse classification of a token endpoint failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenFailureKind {
	/// The endpoint answered with a non-success status.
	Rejected,
	/// The endpoint could not be reached or timed out.
	Unreachable,
	/// The endpoint answered but the payload was unusable.
	Malformed,
}

/// Diagnostics captured from a failed token endpoint call.
///
/// Only provider-facing metadata is stored here. Token values never flow into this type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenEndpointError {
	/// Failure classification.
	pub kind: TokenFailureKind,
	/// HTTP status code, when a response was received.
	pub status: Option<u16>,
	/// OAuth `error` field returned by the provider.
	pub oauth_error: Option<String>,
	/// Human-readable failure summary.
	pub message: String,
	/// Truncated response body for diagnostics.
	pub body: Option<String>,
}
impl TokenEndpointError {
	/// Builds a failure for a non-success response.
	pub fn rejected(status: Option<u16>, message: impl Into<String>) -> Self {
		Self {
			kind: TokenFailureKind::Rejected,
			status,
			oauth_error: None,
			message: message.into(),
			body: None,
		}
	}

	/// Builds a failure for a transport-level problem (DNS, TCP, TLS, timeout).
	pub fn unreachable(message: impl Into<String>) -> Self {
		Self {
			kind: TokenFailureKind::Unreachable,
			status: None,
			oauth_error: None,
			message: message.into(),
			body: None,
		}
	}

	/// Builds a failure for an unusable success payload.
	pub fn malformed(status: Option<u16>, message: impl Into<String>) -> Self {
		Self {
			kind: TokenFailureKind::Malformed,
			status,
			oauth_error: None,
			message: message.into(),
			body: None,
		}
	}

	/// Attaches the provider's OAuth `error` code.
	pub fn with_oauth_error(mut self, error: impl Into<String>) -> Self {
		self.oauth_error = Some(error.into());

		self
	}

	/// Attaches a truncated copy of the response body.
	pub fn with_body(mut self, body: impl AsRef<str>) -> Self {
		self.body = Some(preview(body.as_ref()));

		self
	}
}
impl Display for TokenEndpointError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.message)?;

		if let Some(status) = self.status {
			write!(f, " (HTTP {status})")?;
		}
		if let Some(body) = &self.body {
			write!(f, ": {body}")?;
		}

		Ok(())
	}
}
impl StdError for TokenEndpointError {}

/// Failure reported by the downstream design-platform API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownstreamError {
	/// HTTP method of the forwarded request.
	pub method: String,
	/// Request path (no query string, no credentials).
	pub path: String,
	/// HTTP status, or `None` when the request never got a response.
	pub status: Option<u16>,
	/// Truncated response body or transport message.
	pub body: String,
}
impl Display for DownstreamError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Design API request `{} {}` failed", self.method, self.path)?;

		if let Some(status) = self.status {
			write!(f, " with HTTP {status}")?;
		}

		write!(f, ": {}", self.body)
	}
}
impl StdError for DownstreamError {}

/// Truncates `body` to [`BODY_PREVIEW_LIMIT`] characters, appending an ellipsis when cut.
pub fn preview(body: &str) -> String {
	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf = body.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn token_failures_follow_the_grant() {
		let failure = TokenEndpointError::rejected(Some(400), "Provider rejected the grant.");

		assert!(matches!(
			Error::token_endpoint(GrantType::AuthorizationCode, failure.clone()),
			Error::ExchangeFailed(_)
		));
		assert!(matches!(
			Error::token_endpoint(GrantType::RefreshToken, failure),
			Error::RefreshFailed(_)
		));
	}

	#[test]
	fn token_endpoint_error_renders_status_and_body() {
		let failure = TokenEndpointError::rejected(Some(400), "Provider rejected the grant.")
			.with_oauth_error("invalid_grant")
			.with_body("{\"error\":\"invalid_grant\"}");
		let rendered = Error::RefreshFailed(failure).to_string();

		assert!(rendered.contains("HTTP 400"));
		assert!(rendered.contains("invalid_grant"));
	}

	#[test]
	fn previews_are_truncated() {
		let long = "x".repeat(BODY_PREVIEW_LIMIT + 10);
		let cut = preview(&long);

		assert_eq!(cut.chars().count(), BODY_PREVIEW_LIMIT + 1);
		assert!(cut.ends_with('…'));
		assert_eq!(preview("short"), "short");
	}

	#[test]
	fn downstream_error_mentions_status() {
		let err = DownstreamError {
			method: "GET".into(),
			path: "/v1/designs/abc".into(),
			status: Some(404),
			body: "not found".into(),
		};

		assert_eq!(
			err.to_string(),
			"Design API request `GET /v1/designs/abc` failed with HTTP 404: not found"
		);
	}
}
