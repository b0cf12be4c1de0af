//! # Strata
//!
//! Path-transparent storage access for local files, HTTP(S) and S3, WARC
//! tooling built on it, and a test harness that runs the same tests against
//! live S3 or an in-process emulator.
//!
//! ## Feature Flags
//!
//! ### Presets
//!
//! - `minimal` - Storage access only
//! - `standard` - Storage access and WARC tooling
//! - `full` (default) - Everything, including the S3 emulator
//!
//! ### Fine-grained Control
//!
//! - `storages` - [`storages`]: `StorageBackend` and the `open` helpers
//! - `warc` - [`warc`]: `check`, `extract` and `recompress`
//! - `test` - [`test`]: skip gates, namespaces and fixtures
//! - `s3` - S3 backend and the live-S3 capability probe
//! - `emulator` - in-process S3 emulator fixture
//!
//! ## Quick Example
//!
//! ```rust,no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use strata::storages::open;
//!
//! open::write("/tmp/strata/hello.txt", b"foo").await?;
//! assert_eq!(open::read_to_string("/tmp/strata/hello.txt").await?, "foo");
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "storages")]
pub use strata_storages as storages;

#[cfg(feature = "warc")]
pub use strata_warc as warc;

#[cfg(feature = "test")]
pub use strata_test as test;

#[cfg(feature = "storages")]
pub use strata_storages::{StorageBackend, StorageConfig, StorageError, StorageUri, create_storage};
