//! Client identity and target environment configuration.

// std
use std::env;
// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError};

/// Path and query of the authority's client-credentials endpoint.
pub const TOKEN_ROUTE: &str = "/oauth/v1/generate?grant_type=client_credentials";
/// Environment variable holding the consumer key read by [`ClientIdentity::from_env`].
pub const ENV_CONSUMER_KEY: &str = "MPESA_CONSUMER_KEY";
/// Environment variable holding the consumer secret read by [`ClientIdentity::from_env`].
pub const ENV_CONSUMER_SECRET: &str = "MPESA_CONSUMER_SECRET";
/// Environment variable holding the environment label read by [`ClientIdentity::from_env`].
pub const ENV_ENVIRONMENT: &str = "MPESA_ENVIRONMENT";

/// Target Daraja environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
	/// Safaricom sandbox used for development.
	#[default]
	Sandbox,
	/// Live environment moving real money.
	Production,
}
impl Environment {
	/// Base address of the environment.
	pub const fn base_url(self) -> &'static str {
		match self {
			Self::Sandbox => "https://sandbox.safaricom.co.ke",
			Self::Production => "https://api.safaricom.co.ke",
		}
	}

	/// Stable label suitable for logs and configuration files.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Sandbox => "sandbox",
			Self::Production => "production",
		}
	}
}
impl Display for Environment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Environment {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"sandbox" => Ok(Self::Sandbox),
			"live" | "production" => Ok(Self::Production),
			_ => Err(ConfigError::UnknownEnvironment { value: s.to_owned() }),
		}
	}
}

/// Client id/secret pair plus the base address of the environment they belong to.
///
/// Immutable once built; share it behind an [`Arc`] between the credential cache and the caller.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientIdentity {
	client_id: String,
	client_secret: TokenSecret,
	base_url: Url,
}
impl ClientIdentity {
	/// Builds an identity targeting one of the well-known environments.
	pub fn new(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		environment: Environment,
	) -> Result<Self, ConfigError> {
		Self::with_base_url(client_id, client_secret, environment.base_url())
	}

	/// Builds an identity targeting a custom base address (proxies, mock servers).
	pub fn with_base_url(
		client_id: impl Into<String>,
		client_secret: impl Into<String>,
		base_url: &str,
	) -> Result<Self, ConfigError> {
		let client_id = client_id.into();
		let client_secret = TokenSecret::new(client_secret);

		if client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if client_secret.is_blank() {
			return Err(ConfigError::MissingClientSecret);
		}

		let trimmed = base_url.trim().trim_end_matches('/');
		let base_url = Url::parse(trimmed).map_err(|source| ConfigError::InvalidEndpoint {
			endpoint: trimmed.to_owned(),
			source,
		})?;

		Ok(Self { client_id, client_secret, base_url })
	}

	/// Reads `MPESA_CONSUMER_KEY`, `MPESA_CONSUMER_SECRET` and the optional `MPESA_ENVIRONMENT`
	/// (defaults to sandbox).
	pub fn from_env() -> Result<Self, ConfigError> {
		let client_id = read_env(ENV_CONSUMER_KEY)?;
		let client_secret = read_env(ENV_CONSUMER_SECRET)?;
		let environment = match env::var(ENV_ENVIRONMENT) {
			Ok(value) if !value.trim().is_empty() => value.parse()?,
			_ => Environment::default(),
		};

		Self::new(client_id, client_secret, environment)
	}

	/// Client identifier (consumer key).
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Client secret (consumer secret).
	pub fn client_secret(&self) -> &TokenSecret {
		&self.client_secret
	}

	/// Base address every route is appended to.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Resolves `route` (path plus optional query) against the base address.
	pub fn endpoint(&self, route: &str) -> Result<Url, ConfigError> {
		let base = self.base_url.as_str().trim_end_matches('/');
		let endpoint = if route.starts_with('/') {
			format!("{base}{route}")
		} else {
			format!("{base}/{route}")
		};

		Url::parse(&endpoint).map_err(|source| ConfigError::InvalidEndpoint { endpoint, source })
	}

	/// Authority endpoint issuing client-credentials tokens.
	pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(TOKEN_ROUTE)
	}

	/// `Authorization` header value for the authority: `Basic base64(id:secret)`.
	pub fn basic_authorization(&self) -> String {
		let raw = format!("{}:{}", self.client_id, self.client_secret.expose());

		format!("Basic {}", STANDARD.encode(raw))
	}
}
impl Debug for ClientIdentity {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientIdentity")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("base_url", &self.base_url.as_str())
			.finish()
	}
}

fn read_env(name: &'static str) -> Result<String, ConfigError> {
	env::var(name)
		.ok()
		.filter(|value| !value.trim().is_empty())
		.ok_or(ConfigError::MissingEnvVar { name })
}
