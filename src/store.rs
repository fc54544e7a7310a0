//! Storage contracts and built-in credential store implementations.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialSlot, Credentials, TokenSecret},
};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Durable storage for the two named credential slots.
///
/// The client reads the access slot before every outgoing request, writes both slots after a
/// login or refresh, and erases both on logout or when a refresh fails for good.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Reads the secret stored under `slot`, if present.
	fn load(&self, slot: CredentialSlot) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Persists or replaces the secret stored under `slot`.
	fn save(&self, slot: CredentialSlot, value: TokenSecret) -> StoreFuture<'_, ()>;

	/// Erases `slot`; erasing an empty slot succeeds.
	fn remove(&self, slot: CredentialSlot) -> StoreFuture<'_, ()>;
}
impl dyn CredentialStore {
	/// Reads both slots, returning a pair only when both are present.
	pub async fn load_credentials(&self) -> Result<Option<Credentials>, StoreError> {
		let access = self.load(CredentialSlot::AccessToken).await?;
		let refresh = self.load(CredentialSlot::RefreshToken).await?;

		Ok(access.zip(refresh).map(|(access_token, refresh_token)| Credentials {
			access_token,
			refresh_token,
		}))
	}

	/// Writes both slots from `credentials`.
	pub async fn save_credentials(&self, credentials: &Credentials) -> Result<(), StoreError> {
		for slot in CredentialSlot::ALL {
			self.save(slot, credentials.get(slot).clone()).await?;
		}

		Ok(())
	}

	/// Erases both slots.
	///
	/// Every slot is attempted even when an earlier removal fails; the first failure is
	/// returned.
	pub async fn clear(&self) -> Result<(), StoreError> {
		let mut first_error = None;

		for slot in CredentialSlot::ALL {
			if let Err(e) = self.remove(slot).await {
				first_error.get_or_insert(e);
			}
		}

		first_error.map_or(Ok(()), Err)
	}
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
