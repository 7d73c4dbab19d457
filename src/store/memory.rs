//! Thread-safe in-memory [`CredentialStore`] for tests and single-process deployments.

// self
use crate::{
	_prelude::*,
	auth::{CacheKey, Credential},
	store::{CredentialStore, StoreFuture},
};

type StoreMap = Arc<RwLock<HashMap<CacheKey, Credential>>>;

/// Storage backend that keeps records in-process; clones share the same map.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(StoreMap);
impl MemoryStore {
	/// Number of stored records.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` if no record is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}

	/// Seeds or replaces a record synchronously, e.g. to simulate another process.
	pub fn insert(&self, key: CacheKey, credential: Credential) {
		self.0.write().insert(key, credential);
	}
}
impl CredentialStore for MemoryStore {
	fn load<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<Credential>> {
		let found = self.0.read().get(key).cloned();

		Box::pin(async move { Ok(found) })
	}

	fn save<'a>(&'a self, key: &'a CacheKey, credential: &'a Credential) -> StoreFuture<'a, ()> {
		self.insert(key.clone(), credential.clone());

		Box::pin(async move { Ok(()) })
	}

	fn remove<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, ()> {
		self.0.write().remove(key);

		Box::pin(async move { Ok(()) })
	}
}
