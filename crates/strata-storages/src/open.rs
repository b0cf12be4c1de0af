//! Location-string based access to any backend.
//!
//! These helpers let callers name a file by a single string and leave the
//! choice of backend to the scheme:
//!
//! | Location                      | Backend |
//! |-------------------------------|---------|
//! | `s3://bucket/key`             | S3      |
//! | `http://...`, `https://...`   | HTTP    |
//! | `file:///path`, `/path`, `rel` | Local   |

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::{BackendType, Result, StorageBackend, StorageError, create_storage};

/// A parsed storage location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageUri {
	/// `s3://bucket/key`
	S3 { bucket: String, key: String },
	/// An http(s) URL split into origin and path (with query)
	Http { base: String, path: String },
	/// A local file path
	Local(PathBuf),
}

impl StorageUri {
	/// Parse a location string.
	///
	/// Strings without a `scheme://` prefix are local paths. Unknown schemes
	/// are rejected with `` `StorageError::InvalidUri` ``.
	pub fn parse(uri: &str) -> Result<Self> {
		let Some((scheme, rest)) = uri.split_once("://") else {
			if uri.is_empty() {
				return Err(StorageError::InvalidUri("empty location".to_string()));
			}
			return Ok(StorageUri::Local(PathBuf::from(uri)));
		};

		match scheme.to_ascii_lowercase().as_str() {
			"s3" => {
				let (bucket, key) = rest.split_once('/').unwrap_or((rest, ""));
				if bucket.is_empty() {
					return Err(StorageError::InvalidUri(format!("missing bucket: {}", uri)));
				}
				Ok(StorageUri::S3 {
					bucket: bucket.to_string(),
					key: key.to_string(),
				})
			}
			"http" | "https" => {
				let parsed = url::Url::parse(uri)
					.map_err(|e| StorageError::InvalidUri(format!("{}: {}", uri, e)))?;
				Ok(StorageUri::Http {
					base: parsed.origin().ascii_serialization(),
					path: parsed[url::Position::BeforePath..].to_string(),
				})
			}
			"file" => {
				let parsed = url::Url::parse(uri)
					.map_err(|e| StorageError::InvalidUri(format!("{}: {}", uri, e)))?;
				let path = parsed
					.to_file_path()
					.map_err(|_| StorageError::InvalidUri(format!("not a file path: {}", uri)))?;
				Ok(StorageUri::Local(path))
			}
			other => Err(StorageError::InvalidUri(format!(
				"unsupported scheme '{}': {}",
				other, uri
			))),
		}
	}

	/// Backend type this location maps to.
	pub fn backend_type(&self) -> BackendType {
		match self {
			StorageUri::S3 { .. } => BackendType::S3,
			StorageUri::Http { .. } => BackendType::Http,
			StorageUri::Local(_) => BackendType::Local,
		}
	}

	/// Name of the target relative to the backend built by [`Self::storage_config`].
	pub fn name(&self) -> String {
		match self {
			StorageUri::S3 { key, .. } => key.clone(),
			StorageUri::Http { path, .. } => path.clone(),
			StorageUri::Local(path) => path.to_string_lossy().into_owned(),
		}
	}

	/// Backend configuration able to reach this location.
	///
	/// # Errors
	///
	/// Returns `` `StorageError::ConfigError` `` if the backend's feature is disabled.
	pub fn storage_config(&self) -> Result<StorageConfig> {
		match self {
			#[cfg(feature = "s3")]
			StorageUri::S3 { bucket, .. } => Ok(StorageConfig::S3(crate::config::S3Config {
				bucket: bucket.clone(),
				..Default::default()
			})),
			#[cfg(feature = "http")]
			StorageUri::Http { base, .. } => Ok(StorageConfig::Http(crate::config::HttpConfig {
				base_url: base.clone(),
			})),
			#[cfg(feature = "local")]
			StorageUri::Local(_) => Ok(StorageConfig::LocalPaths),
			#[allow(unreachable_patterns)]
			other => Err(StorageError::ConfigError(format!(
				"Backend type not enabled: {}",
				other.backend_type()
			))),
		}
	}
}

/// Build the backend for `uri` and return it with the name to pass to it.
pub async fn resolve(uri: &str) -> Result<(Arc<dyn StorageBackend>, String)> {
	let parsed = StorageUri::parse(uri)?;
	let backend = create_storage(parsed.storage_config()?).await?;
	Ok((backend, parsed.name()))
}

/// Read the whole file at `uri`.
pub async fn read(uri: &str) -> Result<Vec<u8>> {
	let (backend, name) = resolve(uri).await?;
	backend.open(&name).await
}

/// Read the file at `uri` as text. Invalid UTF-8 is replaced.
pub async fn read_to_string(uri: &str) -> Result<String> {
	let bytes = read(uri).await?;
	Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write `content` to `uri`, replacing any existing file.
pub async fn write(uri: &str, content: &[u8]) -> Result<()> {
	let (backend, name) = resolve(uri).await?;
	backend.save(&name, content).await?;
	Ok(())
}

/// Delete the file at `uri`.
pub async fn delete(uri: &str) -> Result<()> {
	let (backend, name) = resolve(uri).await?;
	backend.delete(&name).await
}

/// Whether a file exists at `uri`.
pub async fn exists(uri: &str) -> Result<bool> {
	let (backend, name) = resolve(uri).await?;
	backend.exists(&name).await
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("s3://bucket/a/b.warc.gz", "bucket", "a/b.warc.gz")]
	#[case("s3://bucket/", "bucket", "")]
	#[case("s3://bucket", "bucket", "")]
	fn parses_s3_locations(#[case] uri: &str, #[case] bucket: &str, #[case] key: &str) {
		assert_eq!(
			StorageUri::parse(uri).unwrap(),
			StorageUri::S3 {
				bucket: bucket.to_string(),
				key: key.to_string(),
			}
		);
	}

	#[rstest]
	#[case(
		"http://127.0.0.1:8000/example.warc.gz",
		"http://127.0.0.1:8000",
		"/example.warc.gz"
	)]
	#[case("https://example.com/a?x=1", "https://example.com", "/a?x=1")]
	fn parses_http_locations(#[case] uri: &str, #[case] base: &str, #[case] path: &str) {
		assert_eq!(
			StorageUri::parse(uri).unwrap(),
			StorageUri::Http {
				base: base.to_string(),
				path: path.to_string(),
			}
		);
	}

	#[rstest]
	#[case("/tmp/x.warc", "/tmp/x.warc")]
	#[case("relative/x.warc", "relative/x.warc")]
	#[case("file:///tmp/x.warc", "/tmp/x.warc")]
	fn parses_local_locations(#[case] uri: &str, #[case] expected: &str) {
		assert_eq!(
			StorageUri::parse(uri).unwrap(),
			StorageUri::Local(PathBuf::from(expected))
		);
	}

	#[rstest]
	#[case("")]
	#[case("s3:///key")]
	#[case("gs://bucket/key")]
	fn rejects_invalid_locations(#[case] uri: &str) {
		assert!(matches!(
			StorageUri::parse(uri),
			Err(StorageError::InvalidUri(_))
		));
	}

	#[rstest]
	#[tokio::test]
	async fn local_write_read_delete() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("nested/hello.txt");
		let uri = path.to_str().unwrap();

		write(uri, b"foo").await.unwrap();
		assert!(exists(uri).await.unwrap());
		assert_eq!(read_to_string(uri).await.unwrap(), "foo");

		delete(uri).await.unwrap();
		assert!(!exists(uri).await.unwrap());
		assert!(read(uri).await.unwrap_err().is_not_found());
	}
}
