//! S3 storage backend implementation.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;

use crate::config::{S3ClientSettings, S3Config};
use crate::s3::{client, map_sdk_error};
use crate::{Result, StorageBackend, StorageError};

/// S3 storage backend.
///
/// Uses the shared client from [`crate::s3::client::shared_client`], so an
/// endpoint override installed by a test harness applies here as well.
#[derive(Debug, Clone)]
pub struct S3Storage {
	client: Client,
	bucket: String,
	prefix: Option<String>,
}

impl S3Storage {
	/// Create a new S3 storage backend.
	///
	/// # Errors
	///
	/// Returns `` `StorageError::ConfigError` `` if the bucket name is empty.
	pub async fn new(config: S3Config) -> Result<Self> {
		if config.bucket.is_empty() {
			return Err(StorageError::ConfigError(
				"S3 bucket name must not be empty".to_string(),
			));
		}

		let settings = S3ClientSettings::from(&config);
		let client = client::shared_client(&settings).await;

		Ok(Self {
			client,
			bucket: config.bucket,
			prefix: config.prefix.filter(|p| !p.is_empty()),
		})
	}

	/// Bucket this backend writes to.
	pub fn bucket(&self) -> &str {
		&self.bucket
	}

	fn get_key(&self, name: &str) -> String {
		let name = name.trim_start_matches('/');
		match &self.prefix {
			Some(prefix) => format!("{}/{}", prefix.trim_end_matches('/'), name),
			None => name.to_string(),
		}
	}
}

#[async_trait]
impl StorageBackend for S3Storage {
	async fn save(&self, name: &str, content: &[u8]) -> Result<String> {
		let key = self.get_key(name);
		tracing::debug!(bucket = %self.bucket, %key, bytes = content.len(), "PutObject");

		self.client
			.put_object()
			.bucket(&self.bucket)
			.key(&key)
			.body(ByteStream::from(content.to_vec()))
			.send()
			.await
			.map_err(|e| map_sdk_error(e, &key))?;

		Ok(key)
	}

	async fn open(&self, name: &str) -> Result<Vec<u8>> {
		let key = self.get_key(name);
		tracing::debug!(bucket = %self.bucket, %key, "GetObject");

		let output = self
			.client
			.get_object()
			.bucket(&self.bucket)
			.key(&key)
			.send()
			.await
			.map_err(|e| {
				if e.as_service_error().is_some_and(|se| se.is_no_such_key()) {
					StorageError::NotFound(key.clone())
				} else {
					map_sdk_error(e, &key)
				}
			})?;

		let data = output
			.body
			.collect()
			.await
			.map_err(|e| StorageError::NetworkError(e.to_string()))?;
		Ok(data.into_bytes().to_vec())
	}

	async fn delete(&self, name: &str) -> Result<()> {
		// S3 reports success for missing keys, so there is no NotFound here.
		let key = self.get_key(name);
		self.client
			.delete_object()
			.bucket(&self.bucket)
			.key(&key)
			.send()
			.await
			.map_err(|e| map_sdk_error(e, &key))?;
		Ok(())
	}

	async fn exists(&self, name: &str) -> Result<bool> {
		let key = self.get_key(name);
		match self
			.client
			.head_object()
			.bucket(&self.bucket)
			.key(&key)
			.send()
			.await
		{
			Ok(_) => Ok(true),
			Err(e) if e.as_service_error().is_some_and(|se| se.is_not_found()) => Ok(false),
			Err(e) => Err(map_sdk_error(e, &key)),
		}
	}

	async fn size(&self, name: &str) -> Result<u64> {
		let key = self.get_key(name);
		let output = self
			.client
			.head_object()
			.bucket(&self.bucket)
			.key(&key)
			.send()
			.await
			.map_err(|e| {
				if e.as_service_error().is_some_and(|se| se.is_not_found()) {
					StorageError::NotFound(key.clone())
				} else {
					map_sdk_error(e, &key)
				}
			})?;

		Ok(output.content_length().unwrap_or_default().max(0) as u64)
	}
}
