//! Transport primitives for authority and operation calls.
//!
//! The SDK only depends on [`HttpTransport`]: a request built from [`http`] types goes in, a
//! buffered response comes out. Callers can plug their own HTTP stack (or a scripted fake in
//! tests) behind it; [`ReqwestTransport`] is the default implementation.

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, error::TransportError};

/// Outbound request with a fully buffered body.
pub type HttpRequest = http::Request<Vec<u8>>;
/// Inbound response with a fully buffered body.
pub type HttpResponse = http::Response<Vec<u8>>;
/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks able to execute one buffered request.
///
/// Implementations must be `Send + Sync + 'static` so a single transport can be shared by the
/// credential cache and the caller behind an [`Arc`], and the futures they return must be `Send`
/// so calls can hop executor threads. Any response, whatever its status, is returned as `Ok`;
/// only failures to obtain a response become [`TransportError`]s. When `timeout` is set the whole
/// exchange (connect, send, read body) must finish within it or fail with
/// [`TransportError::Timeout`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes `request` and buffers the response.
	fn execute(&self, request: HttpRequest, timeout: Option<StdDuration>) -> TransportFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The Daraja endpoints answer directly, so redirects are not followed by
/// [`ReqwestTransport::new`]; configure any custom client passed to
/// [`ReqwestTransport::with_client`] the same way.
#[cfg(feature = "reqwest")]
#[derive(Clone)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
	/// Builds a transport whose client never follows redirects.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client =
			ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}

	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestTransport {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestTransport {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Debug for ReqwestTransport {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("ReqwestTransport(..)")
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestTransport {
	fn execute(&self, request: HttpRequest, timeout: Option<StdDuration>) -> TransportFuture<'_> {
		Box::pin(async move {
			let mut request = reqwest::Request::try_from(request)?;

			if timeout.is_some() {
				*request.timeout_mut() = timeout;
			}

			let response = self.0.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut buffered = HttpResponse::new(response.bytes().await?.to_vec());

			*buffered.status_mut() = status;
			*buffered.headers_mut() = headers;

			Ok(buffered)
		})
	}
}

/// Decodes a response body into `T`, keeping the failing JSON path.
pub(crate) fn decode_json<T>(body: &[u8]) -> Result<T, serde_path_to_error::Error<serde_json::Error>>
where
	T: for<'de> Deserialize<'de>,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
}
