//! Credential-issuing endpoints under `/api/v1/auth` and `/api/v1/oauth`.
//!
//! Login, signup, OAuth callbacks, and the email verification calls are sent without the
//! stored session, so a 401 from them (a wrong password, an expired OAuth code) is reported to
//! the caller as-is and never triggers a refresh. Logout and the explicit refresh run with the
//! session attached.

// self
use crate::{
	_prelude::*,
	api::User,
	auth::{CredentialSlot, Credentials},
	client::{SessionClient, refresh::RefreshTokenBody},
	http::{ApiRequest, HttpTransport},
};

/// Path of the account registration endpoint.
pub const SIGNUP_PATH: &str = "/api/v1/auth/signup";
/// Path of the password login endpoint.
pub const LOGIN_PATH: &str = "/api/v1/auth/login";
/// Path of the logout endpoint.
pub const LOGOUT_PATH: &str = "/api/v1/auth/logout";
/// Path of the verification mail endpoint.
pub const RESEND_VERIFICATION_PATH: &str = "/api/v1/auth/resend-verification";
/// Path of the email verification endpoint.
pub const VERIFY_EMAIL_PATH: &str = "/api/v1/auth/verify-email";
/// Path of the Google OAuth callback exchange.
pub const GOOGLE_LOGIN_PATH: &str = "/api/v1/oauth/google";
/// Path of the Naver OAuth callback exchange.
pub const NAVER_LOGIN_PATH: &str = "/api/v1/oauth/naver";

/// Email and password sign-in payload.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
	/// Account email.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl LoginRequest {
	/// Builds a login payload.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}
impl Debug for LoginRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Account registration payload.
#[derive(Clone, Serialize)]
pub struct SignupRequest {
	/// Account email.
	pub email: String,
	/// Initial password.
	pub password: String,
	/// Display name.
	pub nickname: String,
}
impl Debug for SignupRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SignupRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("nickname", &self.nickname)
			.finish()
	}
}

/// Signed-in user together with the token pair issued for them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
	/// Profile of the signed-in account.
	pub user: User,
	/// Issued token pair (`accessToken`/`refreshToken` at the top level of the payload).
	#[serde(flatten)]
	pub credentials: Credentials,
}

#[derive(Serialize)]
struct EmailBody<'a> {
	email: &'a str,
}

#[derive(Serialize)]
struct OAuthCodeBody<'a> {
	code: &'a str,
	#[serde(skip_serializing_if = "Option::is_none")]
	state: Option<&'a str>,
}

impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Registers a new account; no credentials are issued until the email is verified.
	pub async fn signup(&self, request: &SignupRequest) -> Result<()> {
		self.send(ApiRequest::post(SIGNUP_PATH).json(request)?.without_session()).await?;

		Ok(())
	}

	/// Signs in with email and password and persists the issued token pair.
	pub async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
		self.sign_in(ApiRequest::post(LOGIN_PATH).json(request)?).await
	}

	/// Exchanges a Google authorization code and persists the issued token pair.
	pub async fn google_login(&self, code: &str) -> Result<LoginResponse> {
		let body = OAuthCodeBody { code, state: None };

		self.sign_in(ApiRequest::post(GOOGLE_LOGIN_PATH).json(&body)?).await
	}

	/// Exchanges a Naver authorization code and persists the issued token pair.
	pub async fn naver_login(&self, code: &str, state: &str) -> Result<LoginResponse> {
		let body = OAuthCodeBody { code, state: Some(state) };

		self.sign_in(ApiRequest::post(NAVER_LOGIN_PATH).json(&body)?).await
	}

	/// Revokes the stored refresh token on the server and clears both slots.
	///
	/// The slots are cleared whether or not the server call succeeds; its error, if any, is
	/// still returned.
	pub async fn logout(&self) -> Result<()> {
		let result = self.revoke_session().await;

		self.clear_credentials().await;

		result
	}

	/// Exchanges the stored refresh token for a new pair and persists it.
	///
	/// The exchange joins any refresh already in flight instead of sending a second one. A
	/// rejected exchange ends the session, and without a stored refresh token the session ends
	/// immediately with no request sent.
	pub async fn refresh_session(&self) -> Result<Credentials> {
		self.refresh_on_demand().await
	}

	/// Asks the server to send another verification mail to `email`.
	pub async fn resend_verification(&self, email: &str) -> Result<()> {
		let request =
			ApiRequest::post(RESEND_VERIFICATION_PATH).json(&EmailBody { email })?.without_session();

		self.send(request).await?;

		Ok(())
	}

	/// Confirms an email address with the token from the verification mail.
	pub async fn verify_email(&self, token: &str) -> Result<()> {
		let request =
			ApiRequest::get(VERIFY_EMAIL_PATH).with_query("token", token).without_session();

		self.send(request).await?;

		Ok(())
	}

	async fn revoke_session(&self) -> Result<()> {
		let refresh_token = self.store.load(CredentialSlot::RefreshToken).await?;
		let body = RefreshTokenBody { refresh_token: refresh_token.as_ref().map(|t| t.expose()) };

		self.send(ApiRequest::post(LOGOUT_PATH).json(&body)?).await?;

		Ok(())
	}

	async fn sign_in(&self, request: ApiRequest) -> Result<LoginResponse> {
		let response: LoginResponse = self.send(request.without_session()).await?.data()?;

		self.persist_credentials(&response.credentials).await?;

		Ok(response)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_response_flattens_the_token_pair() {
		let response: LoginResponse = serde_json::from_str(
			r#"{
				"user": {
					"id": 1,
					"email": "kim@example.com",
					"nickname": "kim",
					"subscriptionType": "FREE",
					"emailVerified": true,
					"provider": "LOCAL",
					"createdAt": "2024-06-01T09:30:00"
				},
				"accessToken": "A1",
				"refreshToken": "R1"
			}"#,
		)
		.expect("Login payload should decode.");

		assert_eq!(response.credentials, Credentials::new("A1", "R1"));
		assert_eq!(response.user.email, "kim@example.com");
	}

	#[test]
	fn oauth_body_omits_missing_state() {
		let google = serde_json::to_string(&OAuthCodeBody { code: "c", state: None })
			.expect("Body should serialize.");
		let naver = serde_json::to_string(&OAuthCodeBody { code: "c", state: Some("s") })
			.expect("Body should serialize.");

		assert_eq!(google, r#"{"code":"c"}"#);
		assert_eq!(naver, r#"{"code":"c","state":"s"}"#);
	}

	#[test]
	fn login_request_debug_hides_the_password() {
		let rendered = format!("{:?}", LoginRequest::new("kim@example.com", "hunter2"));

		assert!(rendered.contains("kim@example.com"));
		assert!(!rendered.contains("hunter2"));
	}
}
