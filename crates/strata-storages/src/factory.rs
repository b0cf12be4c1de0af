//! Factory function for creating storage backends.

use crate::{Result, StorageBackend, StorageConfig};
use std::sync::Arc;

/// Create a storage backend from configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use strata_storages::{create_storage, StorageConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = StorageConfig::from_env()?;
///     let storage = create_storage(config).await?;
///     Ok(())
/// }
/// ```
pub async fn create_storage(config: StorageConfig) -> Result<Arc<dyn StorageBackend>> {
	tracing::trace!(backend = %config.backend_type(), "creating storage backend");
	match config {
		#[cfg(feature = "s3")]
		StorageConfig::S3(s3_config) => {
			let storage = crate::backends::s3::S3Storage::new(s3_config).await?;
			Ok(Arc::new(storage))
		}
		#[cfg(feature = "http")]
		StorageConfig::Http(http_config) => {
			let storage = crate::backends::http::HttpStorage::new(http_config)?;
			Ok(Arc::new(storage))
		}
		#[cfg(feature = "local")]
		StorageConfig::Local(local_config) => {
			let storage = crate::backends::local::LocalStorage::new(local_config)?;
			Ok(Arc::new(storage))
		}
		#[cfg(feature = "local")]
		StorageConfig::LocalPaths => Ok(Arc::new(crate::backends::local::LocalStorage::unrooted())),
	}
}
