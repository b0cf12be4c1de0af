//! Local file system storage backend implementation.

use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

use crate::config::LocalConfig;
use crate::{Result, StorageBackend, StorageError};

/// Local file system storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
	base_path: PathBuf,
}

impl LocalStorage {
	/// Create a new local storage backend rooted at `config.base_path`.
	///
	/// # Errors
	///
	/// Returns `` `StorageError::ConfigError` `` if the base path is invalid.
	pub fn new(config: LocalConfig) -> Result<Self> {
		let base_path = PathBuf::from(config.base_path);

		if !base_path.exists() {
			return Err(StorageError::ConfigError(format!(
				"Base path does not exist: {}",
				base_path.display()
			)));
		}

		if !base_path.is_dir() {
			return Err(StorageError::ConfigError(format!(
				"Base path is not a directory: {}",
				base_path.display()
			)));
		}

		Ok(Self { base_path })
	}

	/// Create a backend that resolves names as plain paths.
	///
	/// Used by the open layer, where the caller hands over a complete
	/// (absolute or working-directory relative) path.
	pub fn unrooted() -> Self {
		Self {
			base_path: PathBuf::new(),
		}
	}

	fn get_path(&self, name: &str) -> PathBuf {
		self.base_path.join(name)
	}
}

#[async_trait]
impl StorageBackend for LocalStorage {
	async fn save(&self, name: &str, content: &[u8]) -> Result<String> {
		let path = self.get_path(name);

		// Create parent directories if they don't exist
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).await?;
		}

		fs::write(&path, content).await?;

		Ok(name.to_string())
	}

	async fn open(&self, name: &str) -> Result<Vec<u8>> {
		let path = self.get_path(name);

		if !path.is_file() {
			return Err(StorageError::NotFound(name.to_string()));
		}

		let content = fs::read(&path).await?;
		Ok(content)
	}

	async fn delete(&self, name: &str) -> Result<()> {
		let path = self.get_path(name);

		if !path.exists() {
			return Err(StorageError::NotFound(name.to_string()));
		}

		fs::remove_file(&path).await?;
		Ok(())
	}

	async fn exists(&self, name: &str) -> Result<bool> {
		let path = self.get_path(name);
		Ok(path.exists() && path.is_file())
	}

	async fn size(&self, name: &str) -> Result<u64> {
		let path = self.get_path(name);

		if !path.exists() {
			return Err(StorageError::NotFound(name.to_string()));
		}

		let metadata = fs::metadata(&path).await?;
		Ok(metadata.len())
	}
}
