//! Error types for the harness.

use std::net::SocketAddr;

use thiserror::Error;

use crate::gate::SkipReason;

/// Result type alias for harness operations.
pub type HarnessResult<T> = std::result::Result<T, HarnessError>;

/// Errors raised while setting up or probing test fixtures.
#[derive(Debug, Error)]
pub enum HarnessError {
	/// A prerequisite is missing; the test should be skipped, not failed.
	#[error("skipped: {0}")]
	Skipped(SkipReason),

	/// The emulator could not bind its fixed port.
	#[error("failed to bind S3 emulator on {addr}: {source}")]
	EmulatorBind {
		addr: SocketAddr,
		#[source]
		source: std::io::Error,
	},

	/// A background server failed to start.
	#[error("failed to start server: {0}")]
	ServerStart(std::io::Error),

	/// The emulator accepted the connection but bucket setup failed.
	#[error("failed to create bucket {bucket}: {message}")]
	BucketSetup { bucket: String, message: String },

	/// An S3 request made by a fixture failed.
	#[error("S3 request failed: {0}")]
	S3(String),

	/// The capability probe hit an error it could not classify.
	#[error("S3 capability probe failed: {0}")]
	Probe(String),

	/// A dedicated runtime thread could not be started or panicked.
	#[error("runtime error: {0}")]
	Runtime(String),

	/// Invalid harness configuration.
	#[error("configuration error: {0}")]
	Config(String),

	/// Local file system error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	/// Storage layer error.
	#[error(transparent)]
	Storage(#[from] strata_storages::StorageError),
}
