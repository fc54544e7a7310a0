//! Transport primitives for API requests.
//!
//! The module exposes [`HttpTransport`] so downstream crates can plug in their own HTTP stack,
//! alongside the [`ApiRequest`]/[`ApiReply`] message types the client replays when a refresh
//! completes. The reqwest-backed [`ReqwestTransport`] is available behind the default
//! `reqwest` feature.

pub mod message;

pub use message::*;

#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::_prelude::*;

/// Raw request handed to a transport.
pub type HttpRequest = http::Request<Vec<u8>>;
/// Raw response produced by a transport.
pub type HttpResponse = http::Response<Vec<u8>>;
/// Boxed future returned by [`HttpTransport::execute`].
pub type TransportFuture<'a, E> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, E>> + 'a + Send>>;

/// Abstraction over HTTP stacks capable of executing API requests.
///
/// The trait is the client's only dependency on an HTTP implementation. Implementations must be
/// `Send + Sync + 'static` so one transport can be shared by every clone of a client, and the
/// futures they return must be `Send` so requests can hop executors.
///
/// Any HTTP status, including 401, is a successful transport call; only failures that never
/// produced a response (DNS, TCP, TLS, timeouts) belong in [`HttpTransport::TransportError`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Concrete error emitted by the underlying transport.
	type TransportError: 'static + Send + Sync + StdError;

	/// Executes `request` and buffers the full response body.
	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransport(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestTransport {
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
impl HttpTransport for ReqwestTransport {
	type TransportError = ReqwestError;

	fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
		let client = self.0.clone();

		Box::pin(async move {
			let response = client.execute(request.try_into()?).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}
