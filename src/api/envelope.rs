//! Response envelope wrapping every API body.

// self
use crate::{_prelude::*, api::ApiError};

/// `{ success, data?, error?, timestamp }` wrapper emitted by the API server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope<T> {
	/// Whether the server handled the request successfully.
	#[serde(default)]
	pub success: bool,
	/// Payload for successful responses.
	#[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
	pub data: Option<T>,
	/// Structured error for failed responses.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ApiError>,
	/// Server-side timestamp, when supplied.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub timestamp: Option<String>,
}
impl<T> ApiEnvelope<T> {
	/// Wraps a successful payload.
	pub fn ok(data: T) -> Self {
		Self { success: true, data: Some(data), error: None, timestamp: None }
	}

	/// Wraps a failure.
	pub fn failure(error: ApiError) -> Self {
		Self { success: false, data: None, error: Some(error), timestamp: None }
	}
}
