//! Persistence contracts and built-in stores for cached credentials.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CacheKey, Credential},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend mirroring the credential cache across restarts and processes.
///
/// Stores are best-effort: the cache logs their failures and carries on with the in-memory
/// credential. Implementations must never expose a partially written record to `load`.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Fetches the record stored under `key`, if any. Expired records are returned as-is; the
	/// cache decides usability.
	fn load<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<Credential>>;

	/// Persists or replaces the record stored under `key`.
	fn save<'a>(&'a self, key: &'a CacheKey, credential: &'a Credential) -> StoreFuture<'a, ()>;

	/// Removes the record stored under `key`; removing a missing record succeeds.
	fn remove<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
