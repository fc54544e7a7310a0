//! Normalized error shape surfaced to every caller.

// crates.io
use http::StatusCode;
use time::format_description::well_known::Rfc3339;
// self
use crate::{_prelude::*, api::ApiEnvelope};

/// Symbolic name used when neither the server nor the transport supplied one.
pub const UNKNOWN_ERROR: &str = "UNKNOWN_ERROR";

/// Uniform failure description: numeric code, symbolic name, message, and timestamp.
///
/// The server emits this shape inside the `error` field of its envelope; the client builds the
/// same shape itself for transport failures and unstructured error bodies.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[error("{name} ({code}): {message}")]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
	/// Application error code, or the HTTP status when the server sent none.
	pub code: u32,
	/// Symbolic error name such as `TOKEN_EXPIRED`.
	pub name: String,
	/// Human-readable message.
	pub message: String,
	/// Optional structured details (for example per-field validation failures).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
	/// RFC 3339 instant at which the error was produced.
	#[serde(default = "timestamp_now")]
	pub timestamp: String,
}
impl ApiError {
	/// Builds an error stamped with the current time.
	pub fn new(code: u32, name: impl Into<String>, message: impl Into<String>) -> Self {
		Self {
			code,
			name: name.into(),
			message: message.into(),
			details: None,
			timestamp: timestamp_now(),
		}
	}

	/// Builds the generic fallback used when no structured error is available.
	///
	/// `status` defaults to 500 for failures that never produced an HTTP response.
	pub fn unknown(status: Option<u16>, message: impl Into<String>) -> Self {
		Self::new(status.map(u32::from).unwrap_or(500), UNKNOWN_ERROR, message)
	}

	/// Extracts the server's error from an unsuccessful response, falling back to the status.
	pub fn from_response(status: StatusCode, body: &[u8]) -> Self {
		serde_json::from_slice::<ApiEnvelope<serde_json::Value>>(body)
			.ok()
			.and_then(|envelope| envelope.error)
			.unwrap_or_else(|| {
				Self::unknown(
					Some(status.as_u16()),
					format!("Request failed with status code {}.", status.as_u16()),
				)
			})
	}
}

/// Formats the current UTC instant as RFC 3339.
pub fn timestamp_now() -> String {
	let now = OffsetDateTime::now_utc();

	now.format(&Rfc3339).unwrap_or_else(|_| now.unix_timestamp().to_string())
}
