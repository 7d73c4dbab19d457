//! Credential cache backed by an in-memory slot, a persistent store, and the remote authority.
//!
//! [`CredentialCache::credential`] answers from memory when the held credential is still usable,
//! promotes a usable persisted credential otherwise, and only then contacts the authority. A
//! single async lock owned by the cache serializes every read-modify-write of the memory slot and
//! the store, so concurrent misses result in exactly one acquisition and every waiter observes
//! the same token.

pub mod metrics;

pub use self::metrics::CacheMetrics;

// self
use crate::{
	_prelude::*,
	auth::{CacheKey, Credential},
	clock::{Clock, SystemClock},
	config::ClientIdentity,
	error::ConfigError,
	http::{self, HttpTransport},
	obs::{self, CacheEvent, FlowKind, FlowOutcome, FlowSpan},
	store::{CredentialStore, FileStore},
};

/// Deadline applied to authority and operation calls unless overridden.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);
/// Lifetime assumed when the authority omits `expires_in` or sends an unusable or out-of-range value.
pub const FALLBACK_EXPIRES_IN_SECS: i64 = 300;

/// Owner of the current credential for one [`ClientIdentity`].
pub struct CredentialCache<C>
where
	C: ?Sized + HttpTransport,
{
	identity: Arc<ClientIdentity>,
	http_client: Arc<C>,
	store: Arc<dyn CredentialStore>,
	clock: Arc<dyn Clock>,
	key: CacheKey,
	timeout: StdDuration,
	metrics: Arc<CacheMetrics>,
	current: AsyncMutex<Option<Credential>>,
}
impl<C> CredentialCache<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a cache for `identity` that talks to the authority through `http_client`.
	///
	/// Defaults: [`FileStore`] in the OS temp directory, [`SystemClock`], and [`DEFAULT_TIMEOUT`].
	pub fn new(identity: impl Into<Arc<ClientIdentity>>, http_client: impl Into<Arc<C>>) -> Self {
		let identity = identity.into();
		let key = CacheKey::derive(&identity);

		Self {
			identity,
			http_client: http_client.into(),
			store: Arc::new(FileStore::default()),
			clock: Arc::new(SystemClock),
			key,
			timeout: DEFAULT_TIMEOUT,
			metrics: Default::default(),
			current: AsyncMutex::new(None),
		}
	}

	/// Replaces the persistent store.
	pub fn with_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
		self.store = store;

		self
	}

	/// Replaces the time source used for expiry decisions.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Overrides the deadline applied to authority calls.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Identity whose credential this cache owns.
	pub fn identity(&self) -> &Arc<ClientIdentity> {
		&self.identity
	}

	/// Transport shared with callers built on top of this cache.
	pub fn http_client(&self) -> &Arc<C> {
		&self.http_client
	}

	/// Persistent store mirroring the in-memory credential.
	pub fn store(&self) -> &Arc<dyn CredentialStore> {
		&self.store
	}

	/// Key under which the credential is persisted.
	pub fn key(&self) -> &CacheKey {
		&self.key
	}

	/// Deadline applied to authority calls.
	pub fn timeout(&self) -> StdDuration {
		self.timeout
	}

	/// Counters describing how lookups were served.
	pub fn metrics(&self) -> &Arc<CacheMetrics> {
		&self.metrics
	}

	/// Returns a credential that is usable right now.
	///
	/// Lookup order: memory, persistent store, remote authority. Store failures are logged and
	/// treated as misses. On failure nothing is cached.
	pub async fn credential(&self) -> Result<Credential> {
		const KIND: FlowKind = FlowKind::Credential;

		let span = FlowSpan::new(KIND, "credential");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let mut current = self.current.lock().await;
				let now = self.clock.now();

				if let Some(credential) = current.as_ref().filter(|c| c.is_usable_at(now)) {
					self.metrics.record_hit();
					obs::record_cache_event(CacheEvent::Hit);

					return Ok(credential.clone());
				}

				current.take();

				match self.store.load(&self.key).await {
					Ok(Some(persisted)) if persisted.is_usable_at(now) => {
						self.metrics.record_restore();
						obs::record_cache_event(CacheEvent::Restored);

						*current = Some(persisted.clone());

						return Ok(persisted);
					},
					Ok(_) => {},
					Err(e) => obs::record_store_failure("load", &e),
				}

				let credential = self.acquire().await?;

				if let Err(e) = self.store.save(&self.key, &credential).await {
					obs::record_store_failure("save", &e);
				}

				self.metrics.record_acquisition();
				obs::record_cache_event(CacheEvent::Acquired);

				*current = Some(credential.clone());

				Ok(credential)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Discards the in-memory credential and removes the persisted one.
	///
	/// Idempotent; store failures are logged, never returned.
	pub async fn invalidate(&self) {
		let mut current = self.current.lock().await;

		current.take();

		if let Err(e) = self.store.remove(&self.key).await {
			obs::record_store_failure("remove", &e);
		}

		self.metrics.record_invalidation();
		obs::record_cache_event(CacheEvent::Invalidated);
	}

	/// Invalidates the cache only if it still holds `rejected`.
	///
	/// Returns `false` when the cached credential was already replaced or discarded, for example
	/// by a concurrent call that saw the same rejection first; the newer credential is kept.
	pub async fn invalidate_rejected(&self, rejected: &Credential) -> bool {
		let mut current = self.current.lock().await;
		let stale = match current.as_ref() {
			Some(cached) => cached.token == rejected.token,
			None => match self.store.load(&self.key).await {
				Ok(Some(persisted)) => persisted.token == rejected.token,
				Ok(None) => false,
				Err(e) => {
					obs::record_store_failure("load", &e);

					true
				},
			},
		};

		if !stale {
			return false;
		}

		current.take();

		if let Err(e) = self.store.remove(&self.key).await {
			obs::record_store_failure("remove", &e);
		}

		self.metrics.record_invalidation();
		obs::record_cache_event(CacheEvent::Invalidated);

		true
	}

	async fn acquire(&self) -> Result<Credential> {
		let endpoint = self.identity.token_endpoint()?;
		let request = ::http::Request::get(endpoint.as_str())
			.header(::http::header::AUTHORIZATION, self.identity.basic_authorization())
			.header(::http::header::ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(ConfigError::from)?;
		let issued_at = self.clock.now();
		let response = self
			.http_client
			.execute(request, Some(self.timeout))
			.await
			.map_err(|source| Error::AuthorityUnreachable { source })?;
		let status = response.status();

		if !status.is_success() {
			return Err(Error::AuthorityRejected {
				status: status.as_u16(),
				reason: rejection_reason(status, response.body()),
			});
		}

		let body: TokenResponse = http::decode_json(response.body()).map_err(|source| {
			Error::MalformedCredentialResponse { source, status: status.as_u16() }
		})?;

		if body.access_token.trim().is_empty() {
			return Err(Error::AuthorityRejected {
				status: status.as_u16(),
				reason: "authority returned an empty access token".into(),
			});
		}

		let raw = body.expires_in.as_ref().map(raw_lifetime);
		let issued = body
			.expires_in_secs()
			.and_then(|expires_in| {
				Credential::issue(body.access_token.as_str(), expires_in, issued_at)
			})
			.or_else(|| {
				obs::record_lifetime_fallback(raw.as_deref(), FALLBACK_EXPIRES_IN_SECS);

				Credential::issue(body.access_token.as_str(), FALLBACK_EXPIRES_IN_SECS, issued_at)
			});

		issued.ok_or_else(|| Error::AuthorityRejected {
			status: status.as_u16(),
			reason: "authority returned an unrepresentable token lifetime".into(),
		})
	}
}
impl<C> Debug for CredentialCache<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialCache")
			.field("identity", &self.identity)
			.field("key", &self.key)
			.field("timeout", &self.timeout)
			.field("metrics", &self.metrics)
			.finish()
	}
}

/// Authority response shape; `expires_in` arrives as a numeric string.
#[derive(Debug, Deserialize)]
struct TokenResponse {
	access_token: String,
	#[serde(default)]
	expires_in: Option<Value>,
}
impl TokenResponse {
	fn expires_in_secs(&self) -> Option<i64> {
		match self.expires_in.as_ref()? {
			Value::String(raw) => raw.trim().parse().ok(),
			Value::Number(n) => n.as_i64(),
			_ => None,
		}
	}
}

fn raw_lifetime(value: &Value) -> String {
	match value {
		Value::String(raw) => raw.clone(),
		other => other.to_string(),
	}
}

fn rejection_reason(status: ::http::StatusCode, body: &[u8]) -> String {
	http::decode_json::<JsonMap<String, Value>>(body)
		.ok()
		.and_then(|map| {
			["errorMessage", "error_description", "resultDesc"]
				.into_iter()
				.find_map(|field| map.get(field).and_then(Value::as_str).map(str::to_owned))
		})
		.unwrap_or_else(|| match status.canonical_reason() {
			Some(reason) => format!("HTTP {} {reason}", status.as_u16()),
			None => format!("HTTP {}", status.as_u16()),
		})
}
