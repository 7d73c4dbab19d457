//! SDK-level error types shared by the credential cache, the authenticated caller, and the
//! payload builders.

// self
use crate::{_prelude::*, services::ValidationError};

/// SDK-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical SDK error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure while calling a remote operation endpoint (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Payload builder rejected its inputs before anything was sent.
	#[error(transparent)]
	Validation(#[from] ValidationError),

	/// The authorization endpoint could not be reached or timed out.
	#[error("Authorization endpoint is unreachable.")]
	AuthorityUnreachable {
		/// Underlying transport failure.
		#[source]
		source: TransportError,
	},
	/// The authorization endpoint refused to issue a credential.
	#[error("Authorization endpoint rejected the credential request: {reason}.")]
	AuthorityRejected {
		/// HTTP status code returned by the authority.
		status: u16,
		/// Authority- or SDK-supplied reason string.
		reason: String,
	},
	/// The authorization endpoint answered with a body that is not a token response.
	#[error("Authorization endpoint returned a malformed credential response.")]
	MalformedCredentialResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code returned by the authority.
		status: u16,
	},
	/// A remote operation endpoint rejected the call.
	#[error(
		"Remote endpoint rejected the request with status {status}: {}.",
		.message.as_deref().unwrap_or("no error message")
	)]
	RemoteRejected {
		/// HTTP status code returned by the endpoint.
		status: u16,
		/// Value of the `errorMessage` field, when the body carried one.
		message: Option<String>,
	},
	/// A remote operation endpoint answered with a body that is not a JSON object.
	#[error("Remote endpoint returned a malformed response with status {status}.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code returned by the endpoint.
		status: u16,
	},
}
impl Error {
	/// HTTP status code attached to the error, if the failure came from an HTTP response.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::AuthorityRejected { status, .. }
			| Self::MalformedCredentialResponse { status, .. }
			| Self::RemoteRejected { status, .. }
			| Self::MalformedResponse { status, .. } => Some(*status),
			_ => None,
		}
	}

	/// Returns `true` when the failure originated at the authorization endpoint.
	pub fn is_authority_error(&self) -> bool {
		matches!(
			self,
			Self::AuthorityUnreachable { .. }
				| Self::AuthorityRejected { .. }
				| Self::MalformedCredentialResponse { .. }
		)
	}
}

/// Configuration and request-construction failures raised by the SDK.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Base address or route does not form a valid URL.
	#[error("Endpoint `{endpoint}` is not a valid URL.")]
	InvalidEndpoint {
		/// Offending endpoint string.
		endpoint: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Client identifier is empty.
	#[error("Client identifier cannot be empty.")]
	MissingClientId,
	/// Client secret is empty.
	#[error("Client secret cannot be empty.")]
	MissingClientSecret,
	/// Environment variable required by [`ClientIdentity::from_env`] is absent.
	///
	/// [`ClientIdentity::from_env`]: crate::config::ClientIdentity::from_env
	#[error("Environment variable `{name}` is not set.")]
	MissingEnvVar {
		/// Variable name.
		name: &'static str,
	},
	/// Environment label is neither sandbox nor production.
	#[error("Unknown environment `{value}`; expected `sandbox`, `live`, or `production`.")]
	UnknownEnvironment {
		/// Label that failed to parse.
		value: String,
	},
	/// Call payload could not be serialized to JSON.
	#[error("Call payload could not be serialized.")]
	Payload(#[source] serde_json::Error),
	/// Timestamp could not be rendered for a payload.
	#[error(transparent)]
	Timestamp(#[from] time::error::Format),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// The request did not complete within its deadline.
	#[error("Request timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}

	/// Returns `true` if the failure was a deadline expiry.
	pub fn is_timeout(&self) -> bool {
		matches!(self, Self::Timeout { .. })
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}
