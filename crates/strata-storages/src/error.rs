//! Error types for storage operations.

use thiserror::Error;

/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur while talking to a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
	/// The requested file or object does not exist.
	#[error("File not found: {0}")]
	NotFound(String),

	/// The backend refused access to the resource.
	#[error("Permission denied: {0}")]
	PermissionDenied(String),

	/// Communication with a remote backend failed.
	#[error("Network error: {0}")]
	NetworkError(String),

	/// Backend configuration is missing or invalid.
	#[error("Configuration error: {0}")]
	ConfigError(String),

	/// The URI could not be mapped to any backend.
	#[error("Invalid storage URI: {0}")]
	InvalidUri(String),

	/// The backend does not support the requested operation.
	#[error("Operation not supported: {0}")]
	Unsupported(String),

	/// Local file system error.
	#[error("I/O error: {0}")]
	IoError(#[from] std::io::Error),
}

impl StorageError {
	/// Whether this error means the target simply does not exist.
	pub fn is_not_found(&self) -> bool {
		match self {
			StorageError::NotFound(_) => true,
			StorageError::IoError(e) => e.kind() == std::io::ErrorKind::NotFound,
			_ => false,
		}
	}
}

impl From<reqwest::Error> for StorageError {
	fn from(err: reqwest::Error) -> Self {
		StorageError::NetworkError(err.to_string())
	}
}
