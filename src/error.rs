//! Client-level error types shared across the request pipeline, refresh coordination, and stores.

// self
use crate::{_prelude::*, api::ApiError, config::ClientConfigError, refresh::RefreshFailure};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure while reading or writing credentials.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Normalized failure reported by the server or the transport; never retried.
	#[error(transparent)]
	Api(ApiError),
	/// Token refresh failed and the session was terminated.
	#[error("Session ended: {0}")]
	SessionEnded(RefreshFailure),
	/// Successful response body could not be decoded into the requested type.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure naming the offending field.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Successful response envelope did not carry a data payload.
	#[error("Response envelope is missing its data payload.")]
	MissingData {
		/// HTTP status code of the response.
		status: u16,
	},
}
impl Error {
	/// Maps the error into the uniform `{ code, name, message, timestamp }` shape surfaced to
	/// callers.
	pub fn normalized(&self) -> ApiError {
		match self {
			Self::Api(error) => error.clone(),
			Self::SessionEnded(failure) => failure.error.clone(),
			Self::Storage(error) => ApiError::new(500, "STORAGE_ERROR", error.to_string()),
			Self::Config(error) => ApiError::new(500, "CLIENT_CONFIG_ERROR", error.to_string()),
			Self::Decode { status, .. } | Self::MissingData { status } =>
				ApiError::new(u32::from(*status), "INVALID_RESPONSE", self.to_string()),
		}
	}

	/// Returns `true` when the error terminated the session.
	pub fn is_session_ended(&self) -> bool {
		matches!(self, Self::SessionEnded(_))
	}
}
impl From<ApiError> for Error {
	fn from(e: ApiError) -> Self {
		Self::Api(e)
	}
}

/// Configuration and request construction failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] http::Error),
	/// Client configuration failed validation.
	#[error(transparent)]
	InvalidConfig(#[from] ClientConfigError),
	/// Request path could not be resolved against the base URL.
	#[error("Request path `{path}` does not resolve to a valid URL.")]
	InvalidUrl {
		/// Path that failed to resolve.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Stored access token cannot be sent as a header value.
	#[error("Access token contains characters that are not valid in a header.")]
	InvalidBearer,
	/// Request body could not be encoded as JSON.
	#[error("Request body could not be encoded as JSON.")]
	RequestEncode {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::refresh::RefreshFailure;

	#[test]
	fn session_end_normalizes_to_the_shared_failure() {
		let failure = RefreshFailure::rejected(ApiError::new(401, "INVALID_TOKEN", "Bad token."));
		let error = Error::SessionEnded(failure.clone());

		assert!(error.is_session_ended());
		assert_eq!(error.normalized(), failure.error);
	}

	#[test]
	fn missing_data_normalizes_with_response_status() {
		let normalized = Error::MissingData { status: 200 }.normalized();

		assert_eq!(normalized.code, 200);
		assert_eq!(normalized.name, "INVALID_RESPONSE");
	}
}
