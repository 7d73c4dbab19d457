//! Per-cache lookup counters.

// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing how a [`CredentialCache`](crate::cache::CredentialCache)
/// served its lookups.
#[derive(Debug, Default)]
pub struct CacheMetrics {
	hits: AtomicU64,
	restores: AtomicU64,
	acquisitions: AtomicU64,
	invalidations: AtomicU64,
}
impl CacheMetrics {
	/// Lookups answered from memory.
	pub fn hits(&self) -> u64 {
		self.hits.load(Ordering::Relaxed)
	}

	/// Lookups answered by promoting a persisted credential.
	pub fn restores(&self) -> u64 {
		self.restores.load(Ordering::Relaxed)
	}

	/// Credentials obtained from the remote authority.
	pub fn acquisitions(&self) -> u64 {
		self.acquisitions.load(Ordering::Relaxed)
	}

	/// Explicit invalidations.
	pub fn invalidations(&self) -> u64 {
		self.invalidations.load(Ordering::Relaxed)
	}

	pub(crate) fn record_hit(&self) {
		self.hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_restore(&self) {
		self.restores.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_acquisition(&self) {
		self.acquisitions.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_invalidation(&self) {
		self.invalidations.fetch_add(1, Ordering::Relaxed);
	}
}
