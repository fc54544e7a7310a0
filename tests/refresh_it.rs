#![cfg(feature = "reqwest")]

// std
use std::time::Duration;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use session_client::{
	_preludet::*,
	api::{ApiEnvelope, ApiError},
	auth::{CredentialSlot, Credentials, TokenSecret},
	http::ApiRequest,
	refresh::RefreshFailureReason,
	session::SessionEnded,
	store::{CredentialStore, MemoryStore, StoreError, StoreFuture},
};

const PROFILE_PATH: &str = "/api/v1/users/me";
const REFRESH_PATH: &str = "/api/v1/auth/refresh";

type SessionEvents = Arc<Mutex<Vec<SessionEnded>>>;

fn track_session_end(client: ReqwestTestClient) -> (ReqwestTestClient, SessionEvents) {
	let events = Arc::new(Mutex::new(Vec::new()));
	let sink = events.clone();
	let client = client
		.with_session_end_handler(move |event: &SessionEnded| sink.lock().push(event.clone()));

	(client, events)
}

fn envelope<T>(envelope: ApiEnvelope<T>) -> serde_json::Value
where
	T: Serialize,
{
	serde_json::to_value(envelope).expect("Envelope fixture should serialize.")
}

fn token_expired() -> serde_json::Value {
	envelope(ApiEnvelope::<()>::failure(ApiError::new(
		1003,
		"TOKEN_EXPIRED",
		"Access token expired.",
	)))
}

fn rotated(access: &str, refresh: &str) -> serde_json::Value {
	envelope(ApiEnvelope::ok(Credentials::new(access, refresh)))
}

fn profile(id: i64) -> serde_json::Value {
	json!({ "success": true, "data": { "id": id } })
}

#[tokio::test]
async fn concurrent_401s_share_one_refresh_and_replay_once() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url(), seeded_store("A1", "R1"));
	let (client, events) = track_session_end(client);
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH).header("authorization", "Bearer A1");
			then.status(401).json_body(token_expired());
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH).header("authorization", "Bearer A2");
			then.status(200).json_body(profile(1));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(REFRESH_PATH)
				.header_missing("authorization")
				.json_body(json!({ "refreshToken": "R1" }));
			then.status(200)
				.delay(Duration::from_millis(100))
				.json_body(rotated("A2", "R2"));
		})
		.await;
	let (a, b, c) = tokio::join!(
		client.send(ApiRequest::get(PROFILE_PATH)),
		client.send(ApiRequest::get(PROFILE_PATH)),
		client.send(ApiRequest::get(PROFILE_PATH)),
	);

	for result in [a, b, c] {
		let reply = result.expect("Replayed request should succeed.");
		let body: serde_json::Value = reply.data().expect("Profile should decode.");

		assert_eq!(body["id"], 1);
	}

	refresh.assert_calls_async(1).await;
	expired.assert_calls_async(3).await;
	fresh.assert_calls_async(3).await;
	assert_eq!(store.peek(CredentialSlot::AccessToken), Some(TokenSecret::new("A2")));
	assert_eq!(store.peek(CredentialSlot::RefreshToken), Some(TokenSecret::new("R2")));
	assert!(events.lock().is_empty());
	assert!(!client.coordinator().is_refreshing());
	assert_eq!(client.refresh_metrics.attempts(), 1);
	assert_eq!(client.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn rejected_refresh_ends_the_session_for_every_waiter() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url(), seeded_store("A1", "R1"));
	let (client, events) = track_session_end(client);
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH).header("authorization", "Bearer A1");
			then.status(401).json_body(token_expired());
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(401).delay(Duration::from_millis(100)).json_body(envelope(
				ApiEnvelope::<()>::failure(ApiError::new(
					1004,
					"INVALID_REFRESH_TOKEN",
					"Refresh token is no longer valid.",
				)),
			));
		})
		.await;
	let (a, b, c) = tokio::join!(
		client.send(ApiRequest::get(PROFILE_PATH)),
		client.send(ApiRequest::get(PROFILE_PATH)),
		client.send(ApiRequest::get(PROFILE_PATH)),
	);
	let errors: Vec<_> = [a, b, c]
		.into_iter()
		.map(|result| result.expect_err("Every request should fail."))
		.collect();

	for err in &errors {
		assert!(err.is_session_ended());
		assert_eq!(err.normalized(), errors[0].normalized());
	}

	assert_eq!(errors[0].normalized().name, "INVALID_REFRESH_TOKEN");
	refresh.assert_calls_async(1).await;
	expired.assert_calls_async(3).await;
	assert!(store.is_empty());

	let events = events.lock();

	assert_eq!(events.len(), 1);
	assert_eq!(events[0].failure.reason, RefreshFailureReason::Rejected);
	assert_eq!(events[0].login_url.as_str(), format!("{}/login", server.base_url()));
	assert_eq!(client.refresh_metrics.failures(), 1);
}

#[tokio::test]
async fn missing_refresh_token_ends_the_session_without_an_exchange() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url(), MemoryStore::default());
	let (client, events) = track_session_end(client);

	store
		.save(CredentialSlot::AccessToken, TokenSecret::new("A1"))
		.await
		.expect("Seeding the access token should succeed.");

	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH);
			then.status(401).json_body(token_expired());
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200);
		})
		.await;
	let err = client
		.send(ApiRequest::get(PROFILE_PATH))
		.await
		.expect_err("Missing refresh token should end the session.");

	match err {
		Error::SessionEnded(failure) =>
			assert_eq!(failure.reason, RefreshFailureReason::MissingRefreshToken),
		other => panic!("Unexpected error: {other:?}"),
	}

	expired.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
	assert!(store.is_empty());
	assert_eq!(events.lock().len(), 1);
}

#[tokio::test]
async fn replayed_request_is_not_refreshed_twice() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url(), seeded_store("A1", "R1"));
	let (client, events) = track_session_end(client);
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH);
			then.status(401).json_body(token_expired());
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(200).json_body(rotated("A2", "R2"));
		})
		.await;
	let err = client
		.send(ApiRequest::get(PROFILE_PATH))
		.await
		.expect_err("A second 401 should surface.");

	assert!(!err.is_session_ended());
	assert_eq!(err.normalized().code, 1003);
	rejected.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;
	assert_eq!(store.peek(CredentialSlot::AccessToken), Some(TokenSecret::new("A2")));
	assert!(events.lock().is_empty());
}

#[tokio::test]
async fn failed_exchange_status_is_terminal_but_not_rejected() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url(), seeded_store("A1", "R1"));
	let _expired = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH);
			then.status(401).json_body(token_expired());
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(503).body("unavailable");
		})
		.await;
	let err = client
		.send(ApiRequest::get(PROFILE_PATH))
		.await
		.expect_err("A failed exchange should end the session.");

	match &err {
		Error::SessionEnded(failure) => {
			assert_eq!(failure.reason, RefreshFailureReason::Exchange);
			assert_eq!(failure.error.code, 503);
		},
		other => panic!("Unexpected error: {other:?}"),
	}

	refresh.assert_calls_async(1).await;
	assert!(store.is_empty());
}

#[tokio::test]
async fn explicit_refresh_persists_the_new_pair() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url(), seeded_store("A1", "R1"));
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH).json_body(json!({ "refreshToken": "R1" }));
			then.status(200).json_body(rotated("A2", "R2"));
		})
		.await;
	let credentials = client.refresh_session().await.expect("Explicit refresh should succeed.");

	assert_eq!(credentials.access_token.expose(), "A2");
	assert_eq!(store.peek(CredentialSlot::RefreshToken), Some(TokenSecret::new("R2")));
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn explicit_refresh_401_is_terminal_and_not_retried() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url(), seeded_store("A1", "R1"));
	let (client, events) = track_session_end(client);
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(401).json_body(token_expired());
		})
		.await;
	let err = client.refresh_session().await.expect_err("A rejected refresh should fail.");

	assert!(err.is_session_ended());
	refresh.assert_calls_async(1).await;
	assert!(store.is_empty());
	assert_eq!(events.lock().len(), 1);
	assert!(!client.coordinator().is_refreshing());
}

#[tokio::test]
async fn explicit_refresh_joins_an_in_flight_recovery() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url(), seeded_store("A1", "R1"));
	let _expired = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH).header("authorization", "Bearer A1");
			then.status(401).json_body(token_expired());
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH).header("authorization", "Bearer A2");
			then.status(200).json_body(profile(1));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST)
				.path(REFRESH_PATH)
				.header_missing("authorization")
				.json_body(json!({ "refreshToken": "R1" }));
			then.status(200).delay(Duration::from_millis(200)).json_body(rotated("A2", "R2"));
		})
		.await;
	let (reply, credentials) =
		tokio::join!(client.send(ApiRequest::get(PROFILE_PATH)), client.refresh_session());

	reply.expect("Replayed request should succeed.");

	let credentials = credentials.expect("Explicit refresh should share the exchange.");

	assert_eq!(credentials, Credentials::new("A2", "R2"));
	refresh.assert_calls_async(1).await;
	fresh.assert_calls_async(1).await;
	assert_eq!(store.peek(CredentialSlot::RefreshToken), Some(TokenSecret::new("R2")));
	assert_eq!(client.refresh_metrics.attempts(), 1);
}

#[derive(Clone, Default)]
struct FaultyStore {
	inner: MemoryStore,
	fail_save: bool,
	fail_remove: bool,
}
impl FaultyStore {
	fn failure(operation: &str) -> StoreError {
		StoreError::Backend { message: format!("{operation} unavailable") }
	}
}
impl CredentialStore for FaultyStore {
	fn load(&self, slot: CredentialSlot) -> StoreFuture<'_, Option<TokenSecret>> {
		self.inner.load(slot)
	}

	fn save(&self, slot: CredentialSlot, value: TokenSecret) -> StoreFuture<'_, ()> {
		if self.fail_save {
			return Box::pin(async { Err(Self::failure("save")) });
		}

		self.inner.save(slot, value)
	}

	fn remove(&self, slot: CredentialSlot) -> StoreFuture<'_, ()> {
		if self.fail_remove {
			return Box::pin(async { Err(Self::failure("remove")) });
		}

		self.inner.remove(slot)
	}
}

async fn run_queued_cycle(
	store: FaultyStore,
	exchange_status: u16,
) -> (ReqwestTestClient, Vec<Error>, SessionEvents, MockServer) {
	let server = MockServer::start_async().await;
	let client = build_reqwest_test_client_with_store(&server.base_url(), Arc::new(store));
	let (client, events) = track_session_end(client);

	server
		.mock_async(|when, then| {
			when.method(GET).path(PROFILE_PATH).header("authorization", "Bearer A1");
			then.status(401).json_body(token_expired());
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(POST).path(REFRESH_PATH);
			then.status(exchange_status)
				.delay(Duration::from_millis(100))
				.json_body(rotated("A2", "R2"));
		})
		.await;

	let (a, b, c) = tokio::join!(
		client.send(ApiRequest::get(PROFILE_PATH)),
		client.send(ApiRequest::get(PROFILE_PATH)),
		client.send(ApiRequest::get(PROFILE_PATH)),
	);
	let errors = [a, b, c]
		.into_iter()
		.map(|result| result.expect_err("Every request should fail."))
		.collect();

	(client, errors, events, server)
}

fn assert_shared_failure(errors: &[Error], reason: RefreshFailureReason) {
	for err in errors {
		match err {
			Error::SessionEnded(failure) => assert_eq!(failure.reason, reason),
			other => panic!("Unexpected error: {other:?}"),
		}

		assert_eq!(err.normalized(), errors[0].normalized());
	}
}

#[tokio::test]
async fn failed_persist_ends_the_session_for_every_waiter() {
	let inner = seeded_store("A1", "R1");
	let store = FaultyStore { inner: inner.clone(), fail_save: true, ..Default::default() };
	let (client, errors, events, _server) = run_queued_cycle(store, 200).await;

	assert_shared_failure(&errors, RefreshFailureReason::Storage);
	assert!(errors[0].normalized().message.contains("save unavailable"));
	assert!(inner.is_empty());
	assert!(!client.coordinator().is_refreshing());
	assert_eq!(events.lock().len(), 1);
}

#[tokio::test]
async fn failed_clear_still_settles_and_signals_once() {
	let inner = seeded_store("A1", "R1");
	let store = FaultyStore { inner: inner.clone(), fail_remove: true, ..Default::default() };
	let (client, errors, events, _server) = run_queued_cycle(store, 401).await;

	assert_shared_failure(&errors, RefreshFailureReason::Rejected);
	assert_eq!(inner.peek(CredentialSlot::RefreshToken), Some(TokenSecret::new("R1")));
	assert!(!client.coordinator().is_refreshing());
	assert_eq!(client.coordinator().pending(), 0);
	assert_eq!(events.lock().len(), 1);
}
