//! Refresh failure shared by the leader and every waiter of a cycle.

// self
use crate::{_prelude::*, api::ApiError, store::StoreError};

/// Why a refresh cycle ended without new credentials.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RefreshFailureReason {
	/// No refresh token was stored; no exchange was attempted.
	MissingRefreshToken,
	/// The exchange endpoint rejected the refresh token (HTTP 401).
	Rejected,
	/// The exchange failed for any other reason (transport, status, malformed body).
	Exchange,
	/// Credentials could not be read or persisted.
	Storage,
	/// The refresh leader went away before settling.
	Abandoned,
}
impl RefreshFailureReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RefreshFailureReason::MissingRefreshToken => "missing_refresh_token",
			RefreshFailureReason::Rejected => "rejected",
			RefreshFailureReason::Exchange => "exchange",
			RefreshFailureReason::Storage => "storage",
			RefreshFailureReason::Abandoned => "abandoned",
		}
	}
}
impl Display for RefreshFailureReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Terminal refresh failure carrying the normalized error every participant receives.
///
/// The error is built once when the cycle fails and cloned to each waiter, so all of them
/// observe identical values, timestamp included.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Token refresh failed ({reason}): {error}")]
pub struct RefreshFailure {
	/// Failure classification.
	pub reason: RefreshFailureReason,
	/// Normalized error surfaced to callers.
	pub error: ApiError,
}
impl RefreshFailure {
	/// Pairs a reason with its normalized error.
	pub fn new(reason: RefreshFailureReason, error: ApiError) -> Self {
		Self { reason, error }
	}

	/// No refresh token was available.
	pub fn missing_refresh_token() -> Self {
		Self::new(
			RefreshFailureReason::MissingRefreshToken,
			ApiError::new(401, "NO_REFRESH_TOKEN", "No refresh token is stored."),
		)
	}

	/// The exchange endpoint rejected the refresh token.
	pub fn rejected(error: ApiError) -> Self {
		Self::new(RefreshFailureReason::Rejected, error)
	}

	/// The exchange failed for a reason other than rejection.
	pub fn exchange(error: ApiError) -> Self {
		Self::new(RefreshFailureReason::Exchange, error)
	}

	/// Credentials could not be read or written.
	pub fn storage(error: &StoreError) -> Self {
		Self::new(
			RefreshFailureReason::Storage,
			ApiError::new(500, "STORAGE_ERROR", error.to_string()),
		)
	}

	/// The leader dropped its lease without settling.
	pub fn abandoned() -> Self {
		Self::new(
			RefreshFailureReason::Abandoned,
			ApiError::new(500, "REFRESH_ABANDONED", "Token refresh ended before it settled."),
		)
	}
}
