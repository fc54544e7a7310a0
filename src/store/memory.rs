//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{CredentialSlot, Credentials, TokenSecret},
	store::{CredentialStore, StoreFuture},
};

type SlotMap = Arc<RwLock<HashMap<CredentialSlot, TokenSecret>>>;

/// Thread-safe storage backend that keeps credentials in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SlotMap);
impl MemoryStore {
	/// Creates a store seeded with both slots of `credentials`.
	pub fn with_credentials(credentials: &Credentials) -> Self {
		let store = Self::default();

		{
			let mut guard = store.0.write();

			for slot in CredentialSlot::ALL {
				guard.insert(slot, credentials.get(slot).clone());
			}
		}

		store
	}

	/// Returns the secret currently stored under `slot` without going through the async API.
	pub fn peek(&self, slot: CredentialSlot) -> Option<TokenSecret> {
		self.0.read().get(&slot).cloned()
	}

	/// Returns `true` when no slot holds a value.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl CredentialStore for MemoryStore {
	fn load(&self, slot: CredentialSlot) -> StoreFuture<'_, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(&slot).cloned()) })
	}

	fn save(&self, slot: CredentialSlot, value: TokenSecret) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(slot, value);

			Ok(())
		})
	}

	fn remove(&self, slot: CredentialSlot) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(&slot);

			Ok(())
		})
	}
}
