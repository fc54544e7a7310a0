//! Session-end signal raised when credentials can no longer be recovered.
//!
//! The client does not own navigation. When a refresh fails for good it clears the stored
//! credentials and hands a [`SessionEnded`] event to the configured [`SessionEndHandler`],
//! which is expected to send the user to the login entry point.

// self
use crate::{_prelude::*, refresh::RefreshFailure};

/// Event delivered once per terminated session.
#[derive(Clone, Debug)]
pub struct SessionEnded {
	/// Login entry point the user should be sent to.
	pub login_url: Url,
	/// Failure that ended the session.
	pub failure: RefreshFailure,
}

/// Receiver of session-end events.
pub trait SessionEndHandler
where
	Self: Send + Sync,
{
	/// Called after both credential slots were cleared.
	fn session_ended(&self, event: &SessionEnded);
}
impl<F> SessionEndHandler for F
where
	F: Fn(&SessionEnded) + Send + Sync,
{
	fn session_ended(&self, event: &SessionEnded) {
		self(event)
	}
}

/// Handler that ignores session-end events; the client still logs them.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSessionEnd;
impl SessionEndHandler for NoopSessionEnd {
	fn session_ended(&self, _: &SessionEnded) {}
}
