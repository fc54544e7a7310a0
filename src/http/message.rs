//! Replayable request descriptions and buffered replies.

// crates.io
use http::{
	HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
	header::AUTHORIZATION,
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	api::{ApiEnvelope, ApiError},
	auth::TokenSecret,
	error::ConfigError,
	http::{HttpRequest, HttpResponse},
};

/// Description of an API call that can be issued again after a token refresh.
///
/// Paths are relative to the configured base URL. The bearer header is never stored on the
/// request itself; the client attaches the current access token on every issue.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path appended to the base URL, starting with `/`.
	pub path: String,
	/// Query parameters, percent-encoded when the URL is built.
	pub query: Vec<(String, String)>,
	/// Request-specific headers; these override the configured defaults.
	pub headers: HeaderMap,
	/// Raw request body.
	pub body: Option<Vec<u8>>,
	/// Whether the stored session applies: bearer attachment and refresh-on-401.
	pub authenticated: bool,
}
impl ApiRequest {
	/// Creates a request for `method` and `path` with no body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			body: None,
			authenticated: true,
		}
	}

	/// Creates a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Creates a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Creates a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Creates a `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// Creates a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Appends a query parameter.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Sets a request-specific header.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Sets a raw body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Serializes `body` as the JSON request body.
	pub fn json<B>(mut self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		let bytes =
			serde_json::to_vec(body).map_err(|source| ConfigError::RequestEncode { source })?;

		self.body = Some(bytes);

		Ok(self)
	}

	/// Marks the request as independent of the stored session.
	///
	/// No bearer header is attached and a 401 is surfaced as a normalized error instead of
	/// triggering a refresh. Credential-issuing endpoints (login, signup, OAuth callbacks) use
	/// this so a rejected password is not mistaken for an expired session.
	pub fn without_session(mut self) -> Self {
		self.authenticated = false;

		self
	}

	/// Builds the raw transport request for `url`, layering defaults, request headers, and the
	/// bearer token in that order.
	pub(crate) fn to_http(
		&self,
		url: &Url,
		defaults: &HeaderMap,
		token: Option<&TokenSecret>,
	) -> Result<HttpRequest, ConfigError> {
		let mut request = http::Request::builder()
			.method(self.method.clone())
			.uri(url.as_str())
			.body(self.body.clone().unwrap_or_default())?;
		let headers = request.headers_mut();

		headers.extend(defaults.clone());
		headers.extend(self.headers.clone());

		if let Some(token) = token {
			let mut value =
				HeaderValue::try_from(token.bearer()).map_err(|_| ConfigError::InvalidBearer)?;

			value.set_sensitive(true);
			headers.insert(AUTHORIZATION, value);
		}

		Ok(request)
	}
}

/// Buffered response returned to callers.
#[derive(Clone, Debug)]
pub struct ApiReply {
	/// HTTP status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiReply {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Normalizes the reply into an [`ApiError`], preferring the server's structured error.
	pub fn to_api_error(&self) -> ApiError {
		ApiError::from_response(self.status, &self.body)
	}

	/// Passes successful replies through and normalizes everything else.
	pub fn into_result(self) -> Result<Self> {
		if self.is_success() { Ok(self) } else { Err(Error::Api(self.to_api_error())) }
	}

	/// Decodes the whole body as `T`.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut deserializer = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| Error::Decode { source, status: self.status.as_u16() })
	}

	/// Decodes the body as an [`ApiEnvelope`] and returns its `data` payload.
	pub fn data<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.json::<ApiEnvelope<T>>()?
			.data
			.ok_or(Error::MissingData { status: self.status.as_u16() })
	}
}
impl From<HttpResponse> for ApiReply {
	fn from(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { status: parts.status, headers: parts.headers, body }
	}
}
