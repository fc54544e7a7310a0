//! Profile types and the `/api/v1/users/me` endpoints.

// self
use crate::{
	_prelude::*,
	api::LoginResponse,
	client::SessionClient,
	http::{ApiRequest, HttpTransport},
};

/// Path of the current user's profile.
pub const MY_PROFILE_PATH: &str = "/api/v1/users/me";
/// Path of the password change endpoint.
pub const CHANGE_PASSWORD_PATH: &str = "/api/v1/users/me/password";

/// Subscription tier attached to an account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubscriptionType {
	/// Default tier.
	Free,
	/// Paid tier.
	Premium,
}

/// Identity provider an account was created with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuthProvider {
	/// Email and password.
	Local,
	/// Google OAuth.
	Google,
	/// Naver OAuth.
	Naver,
}

/// Account profile as returned by the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
	/// Server-assigned identifier.
	pub id: i64,
	/// Login email.
	pub email: String,
	/// Display name.
	pub nickname: String,
	/// Avatar URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub profile_image: Option<String>,
	/// Current subscription tier.
	pub subscription_type: SubscriptionType,
	/// Expiry of a paid subscription, as sent by the server.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub subscription_expires_at: Option<String>,
	/// Whether the email address was confirmed.
	pub email_verified: bool,
	/// Provider the account signs in with.
	pub provider: AuthProvider,
	/// Creation instant, as sent by the server.
	pub created_at: String,
}

/// Partial profile update; absent fields are left unchanged.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
	/// New display name.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub nickname: Option<String>,
	/// New avatar URL.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub profile_image: Option<String>,
}

/// Password change payload.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
	/// Password currently on the account.
	pub current_password: String,
	/// Replacement password.
	pub new_password: String,
}
impl Debug for ChangePasswordRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ChangePasswordRequest")
			.field("current_password", &"<redacted>")
			.field("new_password", &"<redacted>")
			.finish()
	}
}

impl<T> SessionClient<T>
where
	T: ?Sized + HttpTransport,
{
	/// Fetches the signed-in user's profile.
	pub async fn my_profile(&self) -> Result<User> {
		self.send(ApiRequest::get(MY_PROFILE_PATH)).await?.data()
	}

	/// Applies a partial profile update and returns the updated profile.
	pub async fn update_profile(&self, update: &UpdateProfileRequest) -> Result<User> {
		self.send(ApiRequest::post(MY_PROFILE_PATH).json(update)?).await?.data()
	}

	/// Changes the account password.
	///
	/// The server revokes the old session and issues a new token pair, which is persisted
	/// before returning.
	pub async fn change_password(&self, request: &ChangePasswordRequest) -> Result<LoginResponse> {
		let response: LoginResponse =
			self.send(ApiRequest::patch(CHANGE_PASSWORD_PATH).json(request)?).await?.data()?;

		self.persist_credentials(&response.credentials).await?;

		Ok(response)
	}
}
