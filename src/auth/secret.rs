//! Redacting holder for consumer secrets and Daraja bearer tokens.

// self
use crate::_prelude::*;

/// Sensitive string, either a consumer secret from [`ClientIdentity`](crate::config::ClientIdentity)
/// or the bearer token of a cached [`Credential`](crate::auth::Credential).
///
/// `Debug` and `Display` never print the value, so identities, credentials and errors can be
/// logged as a whole. Serialization writes the plain string; the credential store relies on it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Takes ownership of `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Plain value, for building `Authorization` headers only.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// `true` for empty or whitespace-only values, which the authority never accepts.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}
