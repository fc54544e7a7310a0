//! Authenticated API client that attaches bearer tokens, coordinates a single-flight token
//! refresh when the server rejects an expired session, and replays every request that was
//! blocked on that refresh.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod refresh;
pub mod session;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Credentials,
		client::SessionClient,
		config::ClientConfig,
		http::ReqwestTransport,
		store::{CredentialStore, MemoryStore},
	};

	/// Client type alias used by reqwest-backed integration tests.
	pub type ReqwestTestClient = SessionClient<ReqwestTransport>;

	/// Builds a reqwest transport for talking to the plain-HTTP servers started by `httpmock`.
	pub fn test_reqwest_transport() -> ReqwestTransport {
		let client = ReqwestClient::builder()
			.build()
			.expect("Failed to build Reqwest client for tests.");

		ReqwestTransport::with_client(client)
	}

	/// Constructs a [`SessionClient`] for `base_url` backed by an arbitrary credential store.
	pub fn build_reqwest_test_client_with_store(
		base_url: &str,
		store: Arc<dyn CredentialStore>,
	) -> ReqwestTestClient {
		let base_url = Url::parse(base_url).expect("Mock server URL should parse.");
		let config = ClientConfig::new(base_url).expect("Test client config should be valid.");

		SessionClient::with_transport(config, store, test_reqwest_transport())
	}

	/// Constructs a [`SessionClient`] for `base_url` that shares `store` with the caller.
	///
	/// [`MemoryStore`] clones share their slots, so the returned store observes every write the
	/// client makes.
	pub fn build_reqwest_test_client(
		base_url: &str,
		store: MemoryStore,
	) -> (ReqwestTestClient, MemoryStore) {
		let client = build_reqwest_test_client_with_store(base_url, Arc::new(store.clone()));

		(client, store)
	}

	/// Returns a store seeded with `access` and `refresh`.
	pub fn seeded_store(access: &str, refresh: &str) -> MemoryStore {
		MemoryStore::with_credentials(&Credentials::new(access, refresh))
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _, tokio as _};
