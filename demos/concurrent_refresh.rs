//! Fires three requests with an expired access token at a mock API and shows that they share a
//! single refresh exchange before being replayed with the new token.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
use url::Url;
// self
use session_client::{
	auth::{CredentialSlot, Credentials},
	client::SessionClient,
	config::ClientConfig,
	http::ApiRequest,
	session::SessionEnded,
	store::{CredentialStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/users/me").header("authorization", "Bearer A1");
			then.status(401).json_body(json!({
				"success": false,
				"error": { "code": 1003, "name": "TOKEN_EXPIRED", "message": "Access token expired." }
			}));
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/v1/users/me").header("authorization", "Bearer A2");
			then.status(200).json_body(json!({ "success": true, "data": { "nickname": "kim" } }));
		})
		.await;
	let exchange = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/v1/auth/refresh");
			then.status(200).json_body(json!({
				"success": true,
				"data": { "accessToken": "A2", "refreshToken": "R2" }
			}));
		})
		.await;
	let memory = MemoryStore::with_credentials(&Credentials::new("A1", "R1"));
	let store: Arc<dyn CredentialStore> = Arc::new(memory.clone());
	let config = ClientConfig::new(Url::parse(&server.base_url())?)?;
	let client = SessionClient::new(config, store).with_session_end_handler(
		|event: &SessionEnded| println!("Session ended, redirecting to {}.", event.login_url),
	);
	let (a, b, c) = tokio::join!(
		client.send(ApiRequest::get("/api/v1/users/me")),
		client.send(ApiRequest::get("/api/v1/users/me")),
		client.send(ApiRequest::get("/api/v1/users/me")),
	);

	for reply in [a?, b?, c?] {
		println!("Replayed request returned {}.", reply.status);
	}

	exchange.assert_calls_async(1).await;
	expired.assert_calls_async(3).await;
	fresh.assert_calls_async(3).await;
	println!(
		"Stored access token rotated: {}.",
		memory.peek(CredentialSlot::AccessToken).is_some_and(|token| token.expose() == "A2")
	);

	Ok(())
}
