//! Authenticated request client.
//!
//! [`SessionClient`] attaches the stored access token to every request, recovers from an
//! expired-token 401 by running (or joining) a single refresh exchange, and replays each
//! blocked request exactly once with the new token. The send pipeline lives in
//! [`send`](self::send), the exchange itself in [`refresh`](self::refresh), and the typed
//! endpoint wrappers in [`crate::api`].

pub mod refresh;
pub mod send;

// self
use crate::{
	_prelude::*,
	auth::Credentials,
	config::ClientConfig,
	http::HttpTransport,
	obs,
	refresh::{RefreshCoordinator, RefreshFailure, RefreshMetrics},
	session::{NoopSessionEnd, SessionEndHandler, SessionEnded},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestTransport;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestSessionClient = SessionClient<ReqwestTransport>;

/// Issues API requests on behalf of the stored session.
///
/// Clones share the transport, the credential store, and the refresh coordinator, so every
/// clone participates in the same single-flight refresh.
pub struct SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Transport used for every outbound request, including the refresh exchange.
	pub transport: Arc<T>,
	/// Durable storage for the access and refresh tokens.
	pub store: Arc<dyn CredentialStore>,
	/// Validated endpoint and header configuration.
	pub config: ClientConfig,
	/// Collaborator notified when a session ends.
	pub session_end: Arc<dyn SessionEndHandler>,
	/// Shared counters for refresh cycles.
	pub refresh_metrics: Arc<RefreshMetrics>,
	coordinator: Arc<RefreshCoordinator>,
}
impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_transport(
		config: ClientConfig,
		store: Arc<dyn CredentialStore>,
		transport: impl Into<Arc<T>>,
	) -> Self {
		Self {
			transport: transport.into(),
			store,
			config,
			session_end: Arc::new(NoopSessionEnd),
			refresh_metrics: Default::default(),
			coordinator: Default::default(),
		}
	}

	/// Sets the collaborator notified when a session ends.
	pub fn with_session_end_handler(mut self, handler: impl 'static + SessionEndHandler) -> Self {
		self.session_end = Arc::new(handler);

		self
	}

	/// Returns the refresh coordinator shared by every clone of this client.
	pub fn coordinator(&self) -> &RefreshCoordinator {
		&self.coordinator
	}

	/// Writes a freshly issued token pair to both slots.
	pub(crate) async fn persist_credentials(&self, credentials: &Credentials) -> Result<()> {
		<dyn CredentialStore>::save_credentials(self.store.as_ref(), credentials).await?;

		Ok(())
	}

	/// Erases both credential slots, logging instead of failing when the store errors.
	pub(crate) async fn clear_credentials(&self) {
		if let Err(e) = <dyn CredentialStore>::clear(self.store.as_ref()).await {
			obs::store_failed("clear_credentials", &e);
		}
	}

	/// Clears the stored session and signals the login redirect.
	pub(crate) async fn end_session(&self, failure: &RefreshFailure) {
		self.clear_credentials().await;
		self.signal_session_end(failure);
	}

	pub(crate) fn signal_session_end(&self, failure: &RefreshFailure) {
		let event =
			SessionEnded { login_url: self.config.login_url().clone(), failure: failure.clone() };

		obs::session_ended(&event);
		self.session_end.session_ended(&event);
	}
}
#[cfg(feature = "reqwest")]
impl SessionClient<ReqwestTransport> {
	/// Creates a new client for `config` backed by a default reqwest transport.
	pub fn new(config: ClientConfig, store: Arc<dyn CredentialStore>) -> Self {
		Self::with_transport(config, store, ReqwestTransport::default())
	}
}
impl<T> Clone for SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			transport: self.transport.clone(),
			store: self.store.clone(),
			config: self.config.clone(),
			session_end: self.session_end.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			coordinator: self.coordinator.clone(),
		}
	}
}
impl<T> Debug for SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("base_url", &self.config.base_url().as_str())
			.field("refreshing", &self.coordinator.is_refreshing())
			.finish()
	}
}
