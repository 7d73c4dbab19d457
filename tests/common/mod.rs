//! Helpers shared by the integration tests.

#![allow(dead_code)]

// std
use std::{
	collections::VecDeque,
	env,
	io,
	path::PathBuf,
	process,
	sync::{
		Arc,
		atomic::{AtomicU64, Ordering},
	},
	time::Duration as StdDuration,
};
// crates.io
use httpmock::MockServer;
use parking_lot::Mutex;
use time::OffsetDateTime;
// self
use mpesa_sdk::{
	cache::CredentialCache,
	config::ClientIdentity,
	error::TransportError,
	http::{HttpRequest, HttpResponse, HttpTransport, ReqwestTransport, TransportFuture},
	store::MemoryStore,
};

pub const CLIENT_ID: &str = "consumer-key";
pub const CLIENT_SECRET: &str = "consumer-secret";
pub const TOKEN_PATH: &str = "/oauth/v1/generate";
pub const BASIC_AUTHORIZATION: &str = "Basic Y29uc3VtZXIta2V5OmNvbnN1bWVyLXNlY3JldA==";

pub type ReqwestCache = CredentialCache<ReqwestTransport>;

pub fn identity(base_url: &str) -> ClientIdentity {
	ClientIdentity::with_base_url(CLIENT_ID, CLIENT_SECRET, base_url)
		.expect("Identity fixture should be valid.")
}

/// Cache wired to `server` through the reqwest transport and an in-memory store.
pub fn reqwest_cache(server: &MockServer) -> (Arc<ReqwestCache>, MemoryStore) {
	let store = MemoryStore::default();
	let transport = ReqwestTransport::new().expect("Reqwest transport should build.");
	let cache: ReqwestCache =
		CredentialCache::new(identity(&server.base_url()), transport).with_store(Arc::new(store.clone()));

	(Arc::new(cache), store)
}

pub fn token_body(token: &str, expires_in: &str) -> String {
	format!(r#"{{"access_token":"{token}","expires_in":"{expires_in}"}}"#)
}

/// Unique directory under the OS temp dir; callers remove it when done.
pub fn temp_dir(label: &str) -> PathBuf {
	static COUNTER: AtomicU64 = AtomicU64::new(0);

	env::temp_dir().join(format!(
		"mpesa_sdk_{label}_{}_{}_{}",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
		COUNTER.fetch_add(1, Ordering::Relaxed),
	))
}

/// Request as seen by [`ScriptedTransport`].
#[derive(Clone, Debug)]
pub struct RecordedRequest {
	pub method: String,
	pub uri: String,
	pub authorization: Option<String>,
	pub body: Vec<u8>,
	pub timeout: Option<StdDuration>,
}
impl RecordedRequest {
	pub fn json(&self) -> serde_json::Value {
		serde_json::from_slice(&self.body).expect("Recorded body should be JSON.")
	}
}

/// Transport replaying a fixed script of `(status, body)` responses in order.
#[derive(Default)]
pub struct ScriptedTransport {
	script: Mutex<VecDeque<(u16, String)>>,
	requests: Mutex<Vec<RecordedRequest>>,
}
impl ScriptedTransport {
	pub fn new<I, S>(script: I) -> Arc<Self>
	where
		I: IntoIterator<Item = (u16, S)>,
		S: Into<String>,
	{
		Arc::new(Self {
			script: Mutex::new(script.into_iter().map(|(status, body)| (status, body.into())).collect()),
			requests: Default::default(),
		})
	}

	pub fn requests(&self) -> Vec<RecordedRequest> {
		self.requests.lock().clone()
	}

	pub fn remaining(&self) -> usize {
		self.script.lock().len()
	}
}
impl HttpTransport for ScriptedTransport {
	fn execute(&self, request: HttpRequest, timeout: Option<StdDuration>) -> TransportFuture<'_> {
		let authorization = request
			.headers()
			.get(http::header::AUTHORIZATION)
			.and_then(|value| value.to_str().ok())
			.map(str::to_owned);

		self.requests.lock().push(RecordedRequest {
			method: request.method().to_string(),
			uri: request.uri().to_string(),
			authorization,
			body: request.body().clone(),
			timeout,
		});

		let next = self.script.lock().pop_front();

		Box::pin(async move {
			let (status, body) =
				next.ok_or_else(|| TransportError::network(io::Error::other("script exhausted")))?;
			let mut response = HttpResponse::new(body.into_bytes());

			*response.status_mut() =
				http::StatusCode::from_u16(status).expect("Scripted status should be valid.");

			Ok(response)
		})
	}
}
