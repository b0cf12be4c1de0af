//! Error types for WARC processing.

use thiserror::Error;

/// Result type alias for WARC operations.
pub type Result<T> = std::result::Result<T, WarcError>;

/// Errors raised while reading, validating or writing WARC archives.
#[derive(Debug, Error)]
pub enum WarcError {
	/// The archive bytes do not form a valid record.
	#[error("Invalid record at offset {offset}: {message}")]
	Parse { offset: u64, message: String },

	/// A gzip member could not be decompressed.
	#[error("Invalid gzip member at offset {offset}: {source}")]
	Gzip {
		offset: u64,
		#[source]
		source: std::io::Error,
	},

	/// The requested record index is past the end of the archive.
	#[error("Record {index} not found; archive has {count} records")]
	RecordIndex { index: usize, count: usize },

	/// Reading or writing the archive location failed.
	#[error(transparent)]
	Storage(#[from] strata_storages::StorageError),

	/// Writing command output failed.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Record summaries could not be serialized.
	#[error("JSON error: {0}")]
	Json(#[from] serde_json::Error),
}

impl WarcError {
	pub(crate) fn parse(offset: u64, message: impl Into<String>) -> Self {
		WarcError::Parse {
			offset,
			message: message.into(),
		}
	}
}
