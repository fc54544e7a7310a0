//! Request pipeline: bearer attachment, 401 recovery, and error normalization.

// crates.io
use http::StatusCode;
// self
use crate::{
	_prelude::*,
	api::ApiError,
	auth::{CredentialSlot, TokenSecret},
	client::SessionClient,
	http::{ApiReply, ApiRequest, HttpTransport},
	obs::{self, OpKind, OpOutcome, OpSpan},
	refresh::{RefreshFailure, RefreshTicket},
};

/// Request paired with its retry marker.
#[derive(Debug)]
struct Attempt {
	request: ApiRequest,
	retried: bool,
}
impl Attempt {
	fn new(request: ApiRequest) -> Self {
		Self { request, retried: false }
	}

	/// A reply triggers recovery only for a session-bound request that has not been replayed.
	fn needs_refresh(&self, reply: &ApiReply) -> bool {
		!self.retried && self.request.authenticated && reply.status == StatusCode::UNAUTHORIZED
	}
}

impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Issues `request` with the stored access token attached.
	///
	/// A 401 on a session-bound request starts (or joins) a single refresh cycle; the request is
	/// then replayed exactly once with the new access token. Every other failure, including a
	/// 401 on the replay, is normalized into [`Error::Api`] and never retried. When the refresh
	/// fails, or the request being rejected is the token exchange itself, both credential slots
	/// are cleared, the session-end handler is signalled, and [`Error::SessionEnded`] is
	/// returned.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiReply> {
		const KIND: OpKind = OpKind::Send;

		let span = OpSpan::new(KIND, "send");

		obs::record_op_outcome(KIND, OpOutcome::Attempt);

		let result = span.instrument(self.dispatch(request)).await;

		match &result {
			Ok(_) => obs::record_op_outcome(KIND, OpOutcome::Success),
			Err(_) => obs::record_op_outcome(KIND, OpOutcome::Failure),
		}

		result
	}

	async fn dispatch(&self, request: ApiRequest) -> Result<ApiReply> {
		let target = self.target_url(&request)?;
		let mut attempt = Attempt::new(request);
		let mut token = None;

		loop {
			// Read before the token so a 401 can be matched to the refresh cycle it belongs to.
			let epoch = self.coordinator.epoch();

			if attempt.request.authenticated && !attempt.retried {
				token = self.store.load(CredentialSlot::AccessToken).await?;
			}

			let reply = self.issue(&attempt.request, &target, token.as_ref()).await?;

			if !attempt.needs_refresh(&reply) {
				return reply.into_result();
			}
			if self.config.is_refresh_url(&target) {
				let failure = RefreshFailure::rejected(reply.to_api_error());

				self.end_session(&failure).await;

				return Err(Error::SessionEnded(failure));
			}

			token = Some(self.await_refresh(epoch).await?);
			attempt.retried = true;
		}
	}

	async fn await_refresh(&self, epoch: u64) -> Result<TokenSecret> {
		match self.coordinator.acquire_or_wait(epoch) {
			RefreshTicket::Lead(lease) =>
				self.lead_refresh(lease).await.map(|credentials| credentials.access_token),
			RefreshTicket::Wait(waiter) => {
				self.refresh_metrics.record_queued();

				waiter.outcome().await.map_err(Error::SessionEnded)
			},
			RefreshTicket::Settled(outcome) => outcome.map_err(Error::SessionEnded),
		}
	}

	/// Resolves the request path and query against the configured base URL.
	pub(crate) fn target_url(&self, request: &ApiRequest) -> Result<Url> {
		let mut url = self.config.resolve(&request.path)?;

		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&request.query);
		}

		Ok(url)
	}

	/// Sends one HTTP request; transport failures are normalized, statuses are passed through.
	pub(crate) async fn issue(
		&self,
		request: &ApiRequest,
		target: &Url,
		token: Option<&TokenSecret>,
	) -> Result<ApiReply> {
		let http_request = request.to_http(target, self.config.default_headers(), token)?;
		let response = self
			.transport
			.execute(http_request)
			.await
			.map_err(|e| Error::Api(ApiError::unknown(None, e.to_string())))?;

		Ok(ApiReply::from(response))
	}
}
