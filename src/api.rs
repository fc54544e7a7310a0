//! Wire shapes shared with the API server and typed wrappers for its session endpoints.
//!
//! Every response body is wrapped in an [`ApiEnvelope`]. Failures are surfaced to callers as
//! an [`ApiError`], whether the server sent one or the client had to synthesize it from the
//! transport status.

pub mod auth;
pub mod envelope;
pub mod error;
pub mod user;

pub use auth::*;
pub use envelope::*;
pub use error::*;
pub use user::*;
