//! Deterministic cache keys derived from a client identity.

// crates.io
use sha2::{Digest, Sha256};
// self
use crate::{_prelude::*, config::ClientIdentity};

const KEY_DOMAIN: &[u8] = b"mpesa-sdk.credential.v1";

/// Stable key naming the cached credential of one [`ClientIdentity`].
///
/// The key is the hex SHA-256 digest of a domain tag, the base address, the client id and the
/// client secret, so distinct identities never share a slot and the same identity maps to the
/// same slot across runs and processes. The secret cannot be recovered from the key.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey(String);
impl CacheKey {
	/// Derives the key for `identity`.
	pub fn derive(identity: &ClientIdentity) -> Self {
		let mut hasher = Sha256::new();

		for part in [
			KEY_DOMAIN,
			identity.base_url().as_str().as_bytes(),
			identity.client_id().as_bytes(),
			identity.client_secret().expose().as_bytes(),
		] {
			hasher.update((part.len() as u64).to_be_bytes());
			hasher.update(part);
		}

		Self(hasher.finalize().iter().map(|byte| format!("{byte:02x}")).collect())
	}

	/// Hex digest backing the key.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "CacheKey({})", self.0)
	}
}
impl Display for CacheKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}
