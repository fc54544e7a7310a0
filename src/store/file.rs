//! JSON file [`CredentialStore`] whose slots survive process restarts.

// std
use std::{
	collections::BTreeMap,
	fs::{self, File},
	io::{self, ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{CredentialSlot, TokenSecret},
	store::{CredentialStore, StoreError, StoreFuture},
};

type Snapshot = BTreeMap<String, TokenSecret>;

/// Credential store backed by a JSON object on disk, keyed by slot name.
///
/// Every mutation rewrites the whole file through a sibling `.tmp` file followed by a rename,
/// so a crash mid-write leaves the previous snapshot intact.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	slots: Arc<RwLock<Snapshot>>,
}
impl FileStore {
	/// Opens the snapshot at `path`, creating parent directories; a missing or empty file
	/// yields an empty store.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		create_parent(&path)?;

		let slots = read_snapshot(&path)?;

		Ok(Self { path, slots: Arc::new(RwLock::new(slots)) })
	}

	/// Location of the snapshot file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn write_snapshot(&self, slots: &Snapshot) -> Result<(), StoreError> {
		let bytes = serde_json::to_vec_pretty(slots).map_err(|e| StoreError::Serialization {
			message: format!("Failed to encode credential snapshot: {e}"),
		})?;
		let staging = self.path.with_extension("tmp");

		create_parent(&self.path)?;

		let mut file = File::create(&staging).map_err(|e| io_error("create", &staging, e))?;

		file.write_all(&bytes).map_err(|e| io_error("write", &staging, e))?;
		file.sync_all().map_err(|e| io_error("sync", &staging, e))?;
		drop(file);

		fs::rename(&staging, &self.path).map_err(|e| io_error("replace", &self.path, e))
	}
}
impl CredentialStore for FileStore {
	fn load(&self, slot: CredentialSlot) -> StoreFuture<'_, Option<TokenSecret>> {
		let value = self.slots.read().get(slot.as_str()).cloned();

		Box::pin(async move { Ok(value) })
	}

	fn save(&self, slot: CredentialSlot, value: TokenSecret) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut slots = self.slots.write();

			slots.insert(slot.as_str().to_owned(), value);

			self.write_snapshot(&slots)
		})
	}

	fn remove(&self, slot: CredentialSlot) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut slots = self.slots.write();

			match slots.remove(slot.as_str()) {
				Some(_) => self.write_snapshot(&slots),
				None => Ok(()),
			}
		})
	}
}

fn read_snapshot(path: &Path) -> Result<Snapshot, StoreError> {
	let bytes = match fs::read(path) {
		Ok(bytes) => bytes,
		Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Snapshot::new()),
		Err(e) => return Err(io_error("read", path, e)),
	};

	if bytes.iter().all(u8::is_ascii_whitespace) {
		return Ok(Snapshot::new());
	}

	serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
		message: format!("Failed to parse {}: {e}", path.display()),
	})
}

fn create_parent(path: &Path) -> Result<(), StoreError> {
	match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() =>
			fs::create_dir_all(parent).map_err(|e| io_error("create directory", parent, e)),
		_ => Ok(()),
	}
}

fn io_error(action: &str, path: &Path, error: io::Error) -> StoreError {
	StoreError::Backend { message: format!("Failed to {action} {}: {error}", path.display()) }
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::auth::Credentials;

	fn temp_path(label: &str) -> PathBuf {
		let unique = format!(
			"session_client_file_store_{label}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn save_and_reload_round_trip() {
		let path = temp_path("reload");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let store: Arc<dyn CredentialStore> = Arc::new(store);

		rt.block_on(store.save_credentials(&Credentials::new("A1", "R1")))
			.expect("Failed to save credentials to file store.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let access = rt
			.block_on(reopened.load(CredentialSlot::AccessToken))
			.expect("Failed to load access token from file store.")
			.expect("File store lost access token after reopen.");

		assert_eq!(access.expose(), "A1");

		let raw = fs::read_to_string(&path).expect("Snapshot file should be readable.");

		assert!(raw.contains("\"refreshToken\""));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn clear_persists_an_empty_snapshot() {
		let path = temp_path("clear");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let store: Arc<dyn CredentialStore> = Arc::new(store);

		rt.block_on(async {
			store.save_credentials(&Credentials::new("A1", "R1")).await?;
			store.clear().await
		})
		.expect("Saving and clearing credentials should succeed.");

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");

		assert!(
			rt.block_on(reopened.load(CredentialSlot::RefreshToken))
				.expect("Loading from reopened store should succeed.")
				.is_none()
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn corrupt_snapshots_surface_serialization_errors() {
		let path = temp_path("corrupt");

		fs::write(&path, b"not json").expect("Failed to write corrupt snapshot fixture.");

		let err = FileStore::open(&path).expect_err("Corrupt snapshots should be rejected.");

		assert!(matches!(err, StoreError::Serialization { .. }));

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
