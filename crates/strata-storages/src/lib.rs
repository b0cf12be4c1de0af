//! # strata-storages
//!
//! Path-transparent storage access.
//!
//! A single location string selects the backend: `s3://bucket/key` goes to
//! Amazon S3 (or whatever endpoint the client factory is pointed at),
//! `http://` and `https://` URLs are fetched read-only, and anything else is
//! a local path. Callers that already know their backend can build one from
//! a [`StorageConfig`] instead.
//!
//! ## Features
//!
//! - **Unified API**: Single `` `StorageBackend` `` trait for all backends
//! - **Async I/O**: All operations are asynchronous using Tokio
//! - **Feature Flags**: Enable only the backends you need
//! - **Endpoint override**: Redirect every S3 client in the process at once
//!
//! ## Example
//!
//! ```rust,no_run
//! use strata_storages::open;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     open::write("s3://my-bucket/tmp/hello.txt", b"foo").await?;
//!     let content = open::read_to_string("s3://my-bucket/tmp/hello.txt").await?;
//!     assert_eq!(content, "foo");
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod backends;
pub mod config;
pub mod error;
pub mod factory;
pub mod open;
#[cfg(feature = "s3")]
pub mod s3;

pub use backend::StorageBackend;
pub use config::{BackendType, StorageConfig};
pub use error::{Result, StorageError};
pub use factory::create_storage;
pub use open::StorageUri;
