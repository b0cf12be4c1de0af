//! # strata-warc
//!
//! WARC archive tooling over any storage location.
//!
//! The [`run`] entry point mirrors the `strata-warc` binary so tests and other
//! tools can drive the commands in-process and capture their output:
//!
//! ```rust,no_run
//! # async fn demo() {
//! let mut out = Vec::new();
//! let code = strata_warc::run(["check", "-v", "s3://bucket/file.warc.gz"], &mut out).await;
//! assert_eq!(code, 0);
//! # }
//! ```

pub mod archive;
pub mod cli;
pub mod commands;
pub mod error;
pub mod record;

pub use archive::{ArchiveFormat, read_records};
pub use cli::run;
pub use error::{Result, WarcError};
pub use record::{DigestStatus, WarcRecord};
