// self
use crate::{
	_prelude::*, obs::OpKind, refresh::RefreshOutcome, session::SessionEnded, store::StoreError,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// A span builder used by client operations.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OpKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("session_client.op", op = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits the start event of a refresh cycle led by this client.
pub fn refresh_started() {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!("Token refresh started.");
	}
}

/// Emits the settle event of a refresh cycle led by this client.
pub fn refresh_settled(outcome: &RefreshOutcome, waiters: usize) {
	#[cfg(feature = "tracing")]
	{
		match outcome {
			Ok(_) => tracing::debug!(waiters, "Token refresh succeeded."),
			Err(failure) => tracing::warn!(
				waiters,
				reason = failure.reason.as_str(),
				code = failure.error.code,
				"Token refresh failed."
			),
		}
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (outcome, waiters);
	}
}

/// Emits the event signalled when a session is terminated.
pub fn session_ended(event: &SessionEnded) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(
			login_url = %event.login_url,
			reason = event.failure.reason.as_str(),
			"Session ended; redirecting to login."
		);
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = event;
	}
}

/// Emits a credential store failure that the caller chose not to propagate.
pub fn store_failed(stage: &'static str, error: &StoreError) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(stage, error = %error, "Credential store operation failed.");
	}

	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, error);
	}
}
