//! Read-only HTTP(S) storage backend implementation.

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::config::HttpConfig;
use crate::{Result, StorageBackend, StorageError};

/// HTTP(S) storage backend.
///
/// Files are fetched with plain `GET`/`HEAD` requests relative to a base URL.
/// Writes are rejected: an HTTP origin is treated as a read-only source.
#[derive(Debug, Clone)]
pub struct HttpStorage {
	client: reqwest::Client,
	base_url: String,
}

impl HttpStorage {
	/// Create a new HTTP storage backend.
	///
	/// # Errors
	///
	/// Returns `` `StorageError::ConfigError` `` if the base URL is not an http(s) URL.
	pub fn new(config: HttpConfig) -> Result<Self> {
		let parsed = url::Url::parse(&config.base_url)
			.map_err(|e| StorageError::ConfigError(format!("Invalid base URL: {}", e)))?;

		if !matches!(parsed.scheme(), "http" | "https") {
			return Err(StorageError::ConfigError(format!(
				"Unsupported URL scheme: {}",
				parsed.scheme()
			)));
		}

		Ok(Self {
			client: reqwest::Client::new(),
			base_url: config.base_url.trim_end_matches('/').to_string(),
		})
	}

	fn get_url(&self, name: &str) -> String {
		let name = name.trim_start_matches('/');
		if name.is_empty() {
			self.base_url.clone()
		} else {
			format!("{}/{}", self.base_url, name)
		}
	}

	fn check_status(status: StatusCode, name: &str) -> Result<()> {
		match status {
			s if s.is_success() => Ok(()),
			StatusCode::NOT_FOUND => Err(StorageError::NotFound(name.to_string())),
			StatusCode::FORBIDDEN | StatusCode::UNAUTHORIZED => {
				Err(StorageError::PermissionDenied(name.to_string()))
			}
			s => Err(StorageError::NetworkError(format!(
				"Unexpected status {} for {}",
				s, name
			))),
		}
	}
}

#[async_trait]
impl StorageBackend for HttpStorage {
	async fn save(&self, name: &str, _content: &[u8]) -> Result<String> {
		Err(StorageError::Unsupported(format!(
			"HTTP backend is read-only: {}",
			self.get_url(name)
		)))
	}

	async fn open(&self, name: &str) -> Result<Vec<u8>> {
		let url = self.get_url(name);
		tracing::debug!(%url, "GET");

		let response = self.client.get(&url).send().await?;
		Self::check_status(response.status(), &url)?;

		let body = response.bytes().await?;
		Ok(body.to_vec())
	}

	async fn delete(&self, name: &str) -> Result<()> {
		Err(StorageError::Unsupported(format!(
			"HTTP backend is read-only: {}",
			self.get_url(name)
		)))
	}

	async fn exists(&self, name: &str) -> Result<bool> {
		let url = self.get_url(name);
		let response = self.client.head(&url).send().await?;

		match response.status() {
			s if s.is_success() => Ok(true),
			StatusCode::NOT_FOUND => Ok(false),
			s => Self::check_status(s, &url).map(|_| false),
		}
	}

	async fn size(&self, name: &str) -> Result<u64> {
		let url = self.get_url(name);
		let response = self.client.head(&url).send().await?;
		Self::check_status(response.status(), &url)?;

		response
			.headers()
			.get(reqwest::header::CONTENT_LENGTH)
			.and_then(|v| v.to_str().ok())
			.and_then(|v| v.parse::<u64>().ok())
			.ok_or_else(|| StorageError::NetworkError(format!("No Content-Length for {}", url)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	#[case("http://localhost:8080", "/file.warc", "http://localhost:8080/file.warc")]
	#[case("http://localhost:8080/", "file.warc", "http://localhost:8080/file.warc")]
	#[case("https://example.com/base", "a/b.gz", "https://example.com/base/a/b.gz")]
	#[case("http://localhost:8080", "", "http://localhost:8080")]
	fn get_url_joins_base_and_name(#[case] base: &str, #[case] name: &str, #[case] expected: &str) {
		let storage = HttpStorage::new(HttpConfig {
			base_url: base.to_string(),
		})
		.unwrap();
		assert_eq!(storage.get_url(name), expected);
	}

	#[rstest]
	fn new_rejects_non_http_scheme() {
		let result = HttpStorage::new(HttpConfig {
			base_url: "ftp://example.com".to_string(),
		});
		assert!(matches!(result, Err(StorageError::ConfigError(_))));
	}

	#[rstest]
	#[tokio::test]
	async fn save_is_unsupported() {
		let storage = HttpStorage::new(HttpConfig {
			base_url: "http://localhost:1".to_string(),
		})
		.unwrap();
		let result = storage.save("x", b"data").await;
		assert!(matches!(result, Err(StorageError::Unsupported(_))));
	}
}
