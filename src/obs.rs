//! Optional observability helpers for client operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `session_client.op` with the `op` and
//!   `stage` fields, plus events when a refresh settles, a session ends, or a credential store
//!   call fails.
//! - Enable `metrics` to increment the `session_client_op_total` counter for every
//!   attempt/success/failure, labeled by `op` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

macro_rules! labeled {
	(
		$(#[$meta:meta])*
		pub enum $name:ident {
			$($(#[$variant_meta:meta])* $variant:ident => $label:literal,)+
		}
	) => {
		$(#[$meta])*
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
		pub enum $name {
			$($(#[$variant_meta])* $variant,)+
		}
		impl $name {
			/// Stable label used as a span field and metric label.
			pub const fn as_str(self) -> &'static str {
				match self {
					$(Self::$variant => $label,)+
				}
			}
		}
		impl Display for $name {
			fn fmt(&self, f: &mut Formatter) -> FmtResult {
				f.write_str(self.as_str())
			}
		}
	};
}

labeled! {
	/// Client operations observed by the instrumentation layer.
	pub enum OpKind {
		/// A request issued through the send pipeline.
		Send => "send",
		/// A refresh cycle led by this client.
		Refresh => "refresh",
	}
}

labeled! {
	/// Outcome recorded for each operation.
	pub enum OpOutcome {
		/// The operation started.
		Attempt => "attempt",
		/// The operation returned `Ok`.
		Success => "success",
		/// The operation returned an error to its caller.
		Failure => "failure",
	}
}
