//! Authenticated calls against remote operation endpoints.
//!
//! [`AuthenticatedCaller::call`] attaches the cached bearer credential to a JSON `POST`, retries
//! exactly once with a freshly acquired credential when the endpoint answers `401`, and maps the
//! decoded body into an [`OperationResponse`] or an [`Error`].

// crates.io
use ::http::{
	StatusCode,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
// self
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;
use crate::{
	_prelude::*,
	auth::Credential,
	cache::CredentialCache,
	config::ClientIdentity,
	error::ConfigError,
	http::{self, HttpResponse, HttpTransport},
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

/// `errorMessage` value the remote API uses while a transaction is still being processed.
///
/// Responses carrying it are returned as successes whatever their status.
pub const PENDING_TRANSACTION_MESSAGE: &str = "The transaction is being processed";

/// Boxed future returned by [`Executor::execute`].
pub type CallFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

#[cfg(feature = "reqwest")]
/// Caller specialized for the crate's default reqwest transport.
pub type ReqwestCaller = AuthenticatedCaller<ReqwestTransport>;

/// Object-safe handle the payload builders use to reach the remote API.
pub trait Executor
where
	Self: Send + Sync,
{
	/// Sends `payload` to `route` with a valid credential attached.
	fn execute<'a>(&'a self, payload: Value, route: &'a str) -> CallFuture<'a, OperationResponse>;
}

/// Decoded JSON object returned by an operation endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationResponse {
	/// HTTP status code of the final attempt.
	pub status: u16,
	/// Decoded response body.
	pub body: JsonMap<String, Value>,
}
impl OperationResponse {
	/// Raw field lookup.
	pub fn field(&self, name: &str) -> Option<&Value> {
		self.body.get(name)
	}

	/// String field lookup; non-string values yield `None`.
	pub fn field_str(&self, name: &str) -> Option<&str> {
		self.field(name).and_then(Value::as_str)
	}

	/// Value of the `errorMessage` field, if present.
	pub fn error_message(&self) -> Option<&str> {
		self.field_str("errorMessage")
	}

	/// Returns `true` if the remote API reported the transaction as still in progress.
	pub fn is_pending(&self) -> bool {
		self.error_message() == Some(PENDING_TRANSACTION_MESSAGE)
	}

	/// Consumes the response and returns the decoded body.
	pub fn into_body(self) -> JsonMap<String, Value> {
		self.body
	}

	fn from_http(response: HttpResponse) -> Result<Self> {
		let status = response.status().as_u16();
		let body = match http::decode_json(response.body()) {
			Ok(body) => body,
			// Gateways answer unauthorized requests with HTML or empty bodies.
			Err(_) if status == StatusCode::UNAUTHORIZED.as_u16() =>
				return Err(Error::RemoteRejected { status, message: None }),
			Err(source) => return Err(Error::MalformedResponse { source, status }),
		};
		let decoded = Self { status, body };

		if status >= 400 && !decoded.is_pending() {
			return Err(Error::RemoteRejected {
				status,
				message: decoded.error_message().map(str::to_owned),
			});
		}

		Ok(decoded)
	}
}

/// Sends JSON payloads to operation endpoints with a cached bearer credential.
pub struct AuthenticatedCaller<C>
where
	C: ?Sized + HttpTransport,
{
	cache: Arc<CredentialCache<C>>,
	timeout: StdDuration,
}
impl<C> AuthenticatedCaller<C>
where
	C: ?Sized + HttpTransport,
{
	/// Builds a caller on top of `cache`, sharing its transport and deadline.
	pub fn with_cache(cache: Arc<CredentialCache<C>>) -> Self {
		let timeout = cache.timeout();

		Self { cache, timeout }
	}

	/// Overrides the deadline applied to operation calls.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Cache supplying credentials to this caller.
	pub fn cache(&self) -> &Arc<CredentialCache<C>> {
		&self.cache
	}

	/// Identity the calls are made on behalf of.
	pub fn identity(&self) -> &ClientIdentity {
		self.cache.identity()
	}

	/// Deadline applied to operation calls.
	pub fn timeout(&self) -> StdDuration {
		self.timeout
	}

	/// Posts `payload` to `route` (appended to the identity's base address).
	pub async fn call<P>(&self, payload: &P, route: &str) -> Result<OperationResponse>
	where
		P: ?Sized + Serialize + Sync,
	{
		self.call_with_timeout(payload, route, self.timeout).await
	}

	/// Same as [`call`](Self::call) with a per-call deadline.
	pub async fn call_with_timeout<P>(
		&self,
		payload: &P,
		route: &str,
		timeout: StdDuration,
	) -> Result<OperationResponse>
	where
		P: ?Sized + Serialize + Sync,
	{
		const KIND: FlowKind = FlowKind::Call;

		let span = FlowSpan::new(KIND, route);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async {
				let credential = self.cache.credential().await?;
				let body = serde_json::to_vec(payload).map_err(ConfigError::Payload)?;
				let endpoint = self.cache.identity().endpoint(route)?;
				let mut response = self.send(&endpoint, &body, &credential, timeout).await?;

				if response.status() == StatusCode::UNAUTHORIZED {
					obs::record_reauthentication(route);
					obs::record_flow_outcome(KIND, FlowOutcome::Retry);

					self.cache.invalidate_rejected(&credential).await;

					let credential = self.cache.credential().await?;

					response = self.send(&endpoint, &body, &credential, timeout).await?;
				}

				OperationResponse::from_http(response)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn send(
		&self,
		endpoint: &Url,
		body: &[u8],
		credential: &Credential,
		timeout: StdDuration,
	) -> Result<HttpResponse> {
		let request = ::http::Request::post(endpoint.as_str())
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json")
			.header(AUTHORIZATION, format!("Bearer {}", credential.token.expose()))
			.body(body.to_vec())
			.map_err(ConfigError::from)?;

		Ok(self.cache.http_client().execute(request, Some(timeout)).await?)
	}
}
#[cfg(feature = "reqwest")]
impl AuthenticatedCaller<ReqwestTransport> {
	/// Builds a caller for `identity` with the default reqwest transport, the system clock, and a
	/// [`FileStore`](crate::store::FileStore) in the OS temp directory.
	pub fn new(identity: ClientIdentity) -> Result<Self> {
		let cache = CredentialCache::new(identity, ReqwestTransport::new()?);

		Ok(Self::with_cache(Arc::new(cache)))
	}
}
impl<C> Clone for AuthenticatedCaller<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self { cache: self.cache.clone(), timeout: self.timeout }
	}
}
impl<C> Debug for AuthenticatedCaller<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthenticatedCaller")
			.field("cache", &self.cache)
			.field("timeout", &self.timeout)
			.finish()
	}
}
impl<C> Executor for AuthenticatedCaller<C>
where
	C: ?Sized + HttpTransport,
{
	fn execute<'a>(&'a self, payload: Value, route: &'a str) -> CallFuture<'a, OperationResponse> {
		Box::pin(async move { self.call(&payload, route).await })
	}
}
