//! Storage backend trait definition.

use crate::Result;
use async_trait::async_trait;

/// Storage backend trait for unified file operations.
///
/// This trait defines a common interface for every backend the open layer can
/// dispatch to (local file system, HTTP(S), S3). Names are backend-relative:
/// a path for local storage, a URL path for HTTP, an object key for S3.
///
/// # Examples
///
/// ```rust,no_run
/// use strata_storages::{StorageBackend, Result};
///
/// async fn example(storage: &dyn StorageBackend) -> Result<()> {
///     storage.save("example.txt", b"Hello, world!").await?;
///
///     if storage.exists("example.txt").await? {
///         let size = storage.size("example.txt").await?;
///         println!("File size: {} bytes", size);
///     }
///
///     Ok(())
/// }
/// ```
#[async_trait]
pub trait StorageBackend: Send + Sync {
	/// Save a file to the storage backend, replacing any previous content.
	///
	/// # Returns
	///
	/// The final file path/name after saving.
	///
	/// # Errors
	///
	/// Returns `` `StorageError::PermissionDenied` `` if write access is denied.
	/// Returns `` `StorageError::Unsupported` `` for read-only backends.
	async fn save(&self, name: &str, content: &[u8]) -> Result<String>;

	/// Open (read) a file from the storage backend.
	///
	/// # Errors
	///
	/// Returns `` `StorageError::NotFound` `` if the file doesn't exist.
	async fn open(&self, name: &str) -> Result<Vec<u8>>;

	/// Delete a file from the storage backend.
	///
	/// # Errors
	///
	/// Returns `` `StorageError::NotFound` `` if the backend can tell the file is missing.
	async fn delete(&self, name: &str) -> Result<()>;

	/// Check if a file exists in the storage backend.
	async fn exists(&self, name: &str) -> Result<bool>;

	/// Get the file size in bytes.
	///
	/// # Errors
	///
	/// Returns `` `StorageError::NotFound` `` if the file doesn't exist.
	async fn size(&self, name: &str) -> Result<u64>;
}
