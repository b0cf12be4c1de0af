//! Configuration types for storage backends.

use crate::{Result, StorageError};
use std::env;
use std::str::FromStr;
#[cfg(feature = "s3")]
use std::time::Duration;

/// Storage backend type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
	/// Amazon S3 (or an S3-compatible endpoint)
	S3,
	/// Plain HTTP(S), read-only
	Http,
	/// Local file system
	Local,
}

impl std::fmt::Display for BackendType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			BackendType::S3 => write!(f, "S3"),
			BackendType::Http => write!(f, "HTTP"),
			BackendType::Local => write!(f, "Local"),
		}
	}
}

impl FromStr for BackendType {
	type Err = StorageError;

	fn from_str(s: &str) -> Result<Self> {
		match s.to_lowercase().as_str() {
			"s3" => Ok(BackendType::S3),
			"http" | "https" => Ok(BackendType::Http),
			"local" | "file" => Ok(BackendType::Local),
			_ => Err(StorageError::ConfigError(format!(
				"Invalid backend type: {}",
				s
			))),
		}
	}
}

/// Configuration for S3 storage backend.
#[cfg(feature = "s3")]
#[derive(Debug, Clone, Default)]
pub struct S3Config {
	/// S3 bucket name
	pub bucket: String,
	/// AWS region (e.g., "us-east-1")
	pub region: Option<String>,
	/// Custom endpoint URL (for emulators or S3-compatible stores)
	pub endpoint: Option<String>,
	/// Path prefix for all files
	pub prefix: Option<String>,
}

/// Client-level S3 settings, independent of any bucket.
///
/// These feed the client factory in [`crate::s3::client`]. A scoped endpoint
/// override installed there takes precedence over `endpoint`.
#[cfg(feature = "s3")]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct S3ClientSettings {
	/// Region to sign requests for; falls back to the SDK provider chain.
	pub region: Option<String>,
	/// Custom endpoint URL.
	pub endpoint: Option<String>,
	/// Use path-style addressing (`http://host/bucket/key`).
	pub force_path_style: bool,
	/// Maximum attempts including the first one; SDK default when unset.
	pub max_attempts: Option<u32>,
	/// Connect and per-operation timeout; SDK default when unset.
	pub timeout: Option<Duration>,
}

#[cfg(feature = "s3")]
impl S3ClientSettings {
	/// Load client settings from environment variables.
	///
	/// - `S3_REGION`: AWS region (optional)
	/// - `S3_ENDPOINT`: Custom endpoint URL (optional, implies path-style)
	pub fn from_env() -> Self {
		let endpoint = env::var("S3_ENDPOINT").ok().filter(|v| !v.is_empty());
		Self {
			region: env::var("S3_REGION").ok().filter(|v| !v.is_empty()),
			force_path_style: endpoint.is_some(),
			endpoint,
			max_attempts: None,
			timeout: None,
		}
	}

	/// Settings for a cheap reachability probe: one attempt, short timeout.
	pub fn probe(mut self, timeout: Duration) -> Self {
		self.max_attempts = Some(1);
		self.timeout = Some(timeout);
		self
	}
}

#[cfg(feature = "s3")]
impl From<&S3Config> for S3ClientSettings {
	fn from(config: &S3Config) -> Self {
		let mut settings = S3ClientSettings::from_env();
		if config.region.is_some() {
			settings.region = config.region.clone();
		}
		if config.endpoint.is_some() {
			settings.endpoint = config.endpoint.clone();
			settings.force_path_style = true;
		}
		settings
	}
}

/// Configuration for the HTTP(S) backend.
#[cfg(feature = "http")]
#[derive(Debug, Clone)]
pub struct HttpConfig {
	/// Base URL that names are resolved against
	pub base_url: String,
}

/// Configuration for local file system backend.
#[cfg(feature = "local")]
#[derive(Debug, Clone)]
pub struct LocalConfig {
	/// Base directory path for file storage
	pub base_path: String,
}

/// Storage configuration.
#[derive(Debug, Clone)]
pub enum StorageConfig {
	#[cfg(feature = "s3")]
	S3(S3Config),
	#[cfg(feature = "http")]
	Http(HttpConfig),
	#[cfg(feature = "local")]
	Local(LocalConfig),
	/// Local file system without a base directory; names are full paths.
	#[cfg(feature = "local")]
	LocalPaths,
}

impl StorageConfig {
	/// Backend type this configuration creates.
	pub fn backend_type(&self) -> BackendType {
		match self {
			#[cfg(feature = "s3")]
			StorageConfig::S3(_) => BackendType::S3,
			#[cfg(feature = "http")]
			StorageConfig::Http(_) => BackendType::Http,
			#[cfg(feature = "local")]
			StorageConfig::Local(_) | StorageConfig::LocalPaths => BackendType::Local,
		}
	}

	/// Load configuration from environment variables.
	///
	/// # Environment Variables
	///
	/// - `STORAGE_BACKEND`: Backend type ("s3", "http", "local")
	///
	/// ## S3 Backend
	/// - `S3_BUCKET`: Bucket name (required)
	/// - `S3_REGION`: AWS region (optional)
	/// - `S3_ENDPOINT`: Custom endpoint URL (optional)
	/// - `S3_PREFIX`: Path prefix (optional)
	///
	/// ## HTTP Backend
	/// - `HTTP_BASE_URL`: Base URL (required)
	///
	/// ## Local Backend
	/// - `LOCAL_BASE_PATH`: Base directory path (required)
	pub fn from_env() -> Result<Self> {
		let backend_type = env::var("STORAGE_BACKEND").map_err(|_| {
			StorageError::ConfigError("STORAGE_BACKEND environment variable not set".to_string())
		})?;

		let backend_type = backend_type.parse::<BackendType>()?;

		match backend_type {
			#[cfg(feature = "s3")]
			BackendType::S3 => {
				let bucket = env::var("S3_BUCKET").map_err(|_| {
					StorageError::ConfigError("S3_BUCKET environment variable not set".to_string())
				})?;
				let region = env::var("S3_REGION").ok();
				let endpoint = env::var("S3_ENDPOINT").ok();
				let prefix = env::var("S3_PREFIX").ok();

				Ok(StorageConfig::S3(S3Config {
					bucket,
					region,
					endpoint,
					prefix,
				}))
			}
			#[cfg(feature = "http")]
			BackendType::Http => {
				let base_url = env::var("HTTP_BASE_URL").map_err(|_| {
					StorageError::ConfigError("HTTP_BASE_URL environment variable not set".to_string())
				})?;

				Ok(StorageConfig::Http(HttpConfig { base_url }))
			}
			#[cfg(feature = "local")]
			BackendType::Local => {
				let base_path = env::var("LOCAL_BASE_PATH").map_err(|_| {
					StorageError::ConfigError(
						"LOCAL_BASE_PATH environment variable not set".to_string(),
					)
				})?;

				Ok(StorageConfig::Local(LocalConfig { base_path }))
			}
			#[allow(unreachable_patterns)]
			_ => Err(StorageError::ConfigError(format!(
				"Backend type not enabled: {:?}",
				backend_type
			))),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[case("s3", BackendType::S3)]
	#[case("S3", BackendType::S3)]
	#[case("https", BackendType::Http)]
	#[case("local", BackendType::Local)]
	#[case("file", BackendType::Local)]
	fn backend_type_parses(#[case] input: &str, #[case] expected: BackendType) {
		assert_eq!(input.parse::<BackendType>().unwrap(), expected);
	}

	#[rstest]
	fn backend_type_rejects_unknown() {
		assert!(matches!(
			"gcs".parse::<BackendType>(),
			Err(StorageError::ConfigError(_))
		));
	}

	#[rstest]
	#[serial(storage_env)]
	fn from_env_requires_backend() {
		// SAFETY: serialized with every other test touching these variables.
		unsafe { env::remove_var("STORAGE_BACKEND") };
		assert!(matches!(
			StorageConfig::from_env(),
			Err(StorageError::ConfigError(_))
		));
	}

	#[rstest]
	#[serial(storage_env)]
	fn from_env_reads_local_backend() {
		// SAFETY: serialized with every other test touching these variables.
		unsafe {
			env::set_var("STORAGE_BACKEND", "local");
			env::set_var("LOCAL_BASE_PATH", "/tmp");
		}

		let config = StorageConfig::from_env().unwrap();
		assert_eq!(config.backend_type(), BackendType::Local);

		unsafe {
			env::remove_var("STORAGE_BACKEND");
			env::remove_var("LOCAL_BASE_PATH");
		}
	}

	#[cfg(feature = "s3")]
	#[rstest]
	fn client_settings_from_config_forces_path_style_for_endpoint() {
		let config = S3Config {
			bucket: "b".to_string(),
			endpoint: Some("http://127.0.0.1:9000".to_string()),
			..Default::default()
		};
		let settings = S3ClientSettings::from(&config);
		assert_eq!(settings.endpoint.as_deref(), Some("http://127.0.0.1:9000"));
		assert!(settings.force_path_style);
	}
}
