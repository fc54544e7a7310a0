//! Credential slots and the access/refresh token pair persisted between requests.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Durable storage slots that hold the session credentials.
///
/// Slot names are fixed so credentials written by one client instance are visible to every
/// other instance sharing the same store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CredentialSlot {
	/// Short-lived bearer credential attached to every request.
	#[serde(rename = "accessToken")]
	AccessToken,
	/// Long-lived credential used only to mint new access tokens.
	#[serde(rename = "refreshToken")]
	RefreshToken,
}
impl CredentialSlot {
	/// Every slot, in the order they are cleared.
	pub const ALL: [Self; 2] = [Self::AccessToken, Self::RefreshToken];

	/// Returns the fixed storage key for the slot.
	pub const fn as_str(self) -> &'static str {
		match self {
			CredentialSlot::AccessToken => "accessToken",
			CredentialSlot::RefreshToken => "refreshToken",
		}
	}
}
impl Display for CredentialSlot {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Access/refresh token pair issued by login, OAuth exchanges, and refreshes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
	/// Bearer credential for individual requests.
	pub access_token: TokenSecret,
	/// Credential accepted by the token exchange endpoint.
	pub refresh_token: TokenSecret,
}
impl Credentials {
	/// Pairs an access token with its refresh token.
	pub fn new(access_token: impl Into<TokenSecret>, refresh_token: impl Into<TokenSecret>) -> Self {
		Self { access_token: access_token.into(), refresh_token: refresh_token.into() }
	}

	/// Returns the secret stored under `slot`.
	pub fn get(&self, slot: CredentialSlot) -> &TokenSecret {
		match slot {
			CredentialSlot::AccessToken => &self.access_token,
			CredentialSlot::RefreshToken => &self.refresh_token,
		}
	}
}
