//! Refresh exchange led by the request that first observed an expired session.

// crates.io
use http::StatusCode;
// self
use crate::{
	_prelude::*,
	auth::{CredentialSlot, Credentials, TokenSecret},
	client::SessionClient,
	http::{ApiRequest, HttpTransport},
	obs::{self, OpKind, OpOutcome, OpSpan},
	refresh::{RefreshFailure, RefreshLease, RefreshTicket},
	store::CredentialStore,
};

/// `{ "refreshToken": ... }` body accepted by the exchange and logout endpoints.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RefreshTokenBody<'a> {
	pub(crate) refresh_token: Option<&'a str>,
}

impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Runs the refresh cycle owned by `lease`, settles it, and returns the rotated pair.
	///
	/// New credentials are persisted, or the old ones cleared, before the lease is settled, so
	/// no request issued after the settle can read a stale access token.
	pub(crate) async fn lead_refresh(&self, lease: RefreshLease) -> Result<Credentials> {
		const KIND: OpKind = OpKind::Refresh;

		let span = OpSpan::new(KIND, "lead_refresh");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);
		self.refresh_metrics.record_attempt();
		obs::refresh_started();

		let rotated = span.instrument(self.rotate_credentials()).await;

		if rotated.is_err() {
			self.clear_credentials().await;
		}

		let outcome = match &rotated {
			Ok(credentials) => Ok(credentials.access_token.clone()),
			Err(failure) => Err(failure.clone()),
		};
		let waiters = lease.settle(outcome.clone());

		obs::refresh_settled(&outcome, waiters);

		match rotated {
			Ok(credentials) => {
				self.refresh_metrics.record_success();
				obs::record_op_outcome(KIND, OpOutcome::Success);

				Ok(credentials)
			},
			Err(failure) => {
				self.signal_session_end(&failure);
				self.refresh_metrics.record_failure();
				obs::record_op_outcome(KIND, OpOutcome::Failure);

				Err(Error::SessionEnded(failure))
			},
		}
	}

	/// Runs a refresh cycle on demand, or joins the one already in flight.
	///
	/// The exchange is shared with every 401 recovery in progress, so at most one exchange call
	/// is outstanding. A joined cycle's pair is read back from the store, which the leader
	/// writes before settling.
	pub(crate) async fn refresh_on_demand(&self) -> Result<Credentials> {
		let access_token = match self.coordinator.acquire_or_wait(self.coordinator.epoch()) {
			RefreshTicket::Lead(lease) => return self.lead_refresh(lease).await,
			RefreshTicket::Wait(waiter) => {
				self.refresh_metrics.record_queued();

				waiter.outcome().await
			},
			RefreshTicket::Settled(outcome) => outcome,
		}
		.map_err(Error::SessionEnded)?;
		let refresh_token = self
			.store
			.load(CredentialSlot::RefreshToken)
			.await?
			.ok_or_else(|| Error::SessionEnded(RefreshFailure::missing_refresh_token()))?;

		Ok(Credentials { access_token, refresh_token })
	}

	async fn rotate_credentials(&self) -> Result<Credentials, RefreshFailure> {
		let refresh_token = self
			.store
			.load(CredentialSlot::RefreshToken)
			.await
			.map_err(|e| RefreshFailure::storage(&e))?
			.ok_or_else(RefreshFailure::missing_refresh_token)?;
		let credentials = self.exchange(&refresh_token).await?;

		<dyn CredentialStore>::save_credentials(self.store.as_ref(), &credentials)
			.await
			.map_err(|e| RefreshFailure::storage(&e))?;

		Ok(credentials)
	}

	/// Performs one token exchange without touching the credential store.
	///
	/// The call carries no bearer header. A 401 is reported as
	/// [`RefreshFailureReason::Rejected`](crate::refresh::RefreshFailureReason::Rejected); any
	/// other failure as `Exchange`.
	pub async fn exchange(&self, refresh_token: &TokenSecret) -> Result<Credentials, RefreshFailure> {
		let request = ApiRequest::post(self.config.refresh_path())
			.json(&RefreshTokenBody { refresh_token: Some(refresh_token.expose()) })
			.map_err(|e| RefreshFailure::exchange(Error::from(e).normalized()))?
			.without_session();
		let reply = self
			.issue(&request, self.config.refresh_url(), None)
			.await
			.map_err(|e| RefreshFailure::exchange(e.normalized()))?;

		if reply.status == StatusCode::UNAUTHORIZED {
			return Err(RefreshFailure::rejected(reply.to_api_error()));
		}
		if !reply.is_success() {
			return Err(RefreshFailure::exchange(reply.to_api_error()));
		}

		reply.data::<Credentials>().map_err(|e| RefreshFailure::exchange(e.normalized()))
	}
}
