//! File-backed [`CredentialStore`] sharing credentials across restarts and processes.

// std
use std::{
	env,
	fs::{self, File, OpenOptions},
	io::{self, ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{CacheKey, Credential},
	obs,
	store::{CredentialStore, StoreError, StoreFuture},
};

const FILE_PREFIX: &str = "mpesa_token_";

/// Persists one JSON file per cache key inside a directory.
///
/// Writes land in a uniquely named sibling temp file that is synced and renamed over the target,
/// so readers in this or any other process see either the previous record or the new one. Only
/// when that path fails does the store fall back to writing the target directly.
#[derive(Clone, Debug)]
pub struct FileStore {
	dir: PathBuf,
}
impl FileStore {
	/// Creates a store rooted at `dir`; the directory is created on first write.
	pub fn new(dir: impl Into<PathBuf>) -> Self {
		Self { dir: dir.into() }
	}

	/// Creates a store rooted at the OS temp directory.
	pub fn in_temp_dir() -> Self {
		Self::new(env::temp_dir())
	}

	/// Directory holding the credential files.
	pub fn dir(&self) -> &Path {
		&self.dir
	}

	/// Deterministic file path for `key`.
	pub fn path_for(&self, key: &CacheKey) -> PathBuf {
		self.dir.join(format!("{FILE_PREFIX}{key}.json"))
	}

	fn read_record(path: &Path) -> Result<Option<Credential>, StoreError> {
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", path.display()),
				}),
		};

		if bytes.is_empty() {
			return Ok(None);
		}

		serde_json::from_slice(&bytes).map(Some).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_dir_exists(&self) -> Result<(), StoreError> {
		if self.dir.as_os_str().is_empty() {
			return Ok(());
		}

		fs::create_dir_all(&self.dir).map_err(|e| StoreError::Backend {
			message: format!("Failed to create store directory {}: {e}", self.dir.display()),
		})
	}

	fn persist(&self, path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
		self.persist_with(path, bytes, |file, bytes| file.write_all(bytes))
	}

	/// Writes `bytes` to `path` through a temp file, letting `write` fill the temp file.
	fn persist_with<W>(&self, path: &Path, bytes: &[u8], write: W) -> Result<(), StoreError>
	where
		W: FnOnce(&mut File, &[u8]) -> io::Result<()>,
	{
		self.ensure_dir_exists()?;

		match write_atomic(path, bytes, write) {
			Ok(()) => Ok(()),
			Err(e) => {
				obs::record_store_failure("atomic_write", &e);

				fs::write(path, bytes).map_err(|e| StoreError::Backend {
					message: format!("Failed to write {}: {e}", path.display()),
				})
			},
		}
	}

	fn remove_record(path: &Path) -> Result<(), StoreError> {
		match fs::remove_file(path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to remove {}: {e}", path.display()),
			}),
		}
	}
}
impl Default for FileStore {
	fn default() -> Self {
		Self::in_temp_dir()
	}
}
impl CredentialStore for FileStore {
	fn load<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, Option<Credential>> {
		Box::pin(async move { Self::read_record(&self.path_for(key)) })
	}

	fn save<'a>(&'a self, key: &'a CacheKey, credential: &'a Credential) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let serialized = serde_json::to_vec(credential).map_err(|e| {
				StoreError::Serialization { message: format!("Failed to serialize credential: {e}") }
			})?;

			self.persist(&self.path_for(key), &serialized)
		})
	}

	fn remove<'a>(&'a self, key: &'a CacheKey) -> StoreFuture<'a, ()> {
		Box::pin(async move { Self::remove_record(&self.path_for(key)) })
	}
}

fn write_atomic<W>(path: &Path, bytes: &[u8], write: W) -> io::Result<()>
where
	W: FnOnce(&mut File, &[u8]) -> io::Result<()>,
{
	let tmp_path = temp_sibling(path);
	let result = (|| {
		let mut file = OpenOptions::new().write(true).create_new(true).open(&tmp_path)?;

		write(&mut file, bytes)?;
		file.sync_all()?;
		drop(file);

		fs::rename(&tmp_path, path)
	})();

	if result.is_err() {
		let _ = fs::remove_file(&tmp_path);
	}

	result
}

fn temp_sibling(path: &Path) -> PathBuf {
	let name = path.file_name().map(|name| name.to_string_lossy()).unwrap_or_default();

	path.with_file_name(format!(".{name}.{:016x}.tmp", rand::random::<u64>()))
}
