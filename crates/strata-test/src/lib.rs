//! # Strata Test
//!
//! Fixtures for exercising storage code against local disk, HTTP and S3
//! without the test knowing which backend it got.
//!
//! ## Features
//!
//! - **Skip gates**: [`skip_unless!`] and [`acquire_or_skip!`] turn missing
//!   credentials or a disable switch into a reported skip
//! - **Capability probe**: one cached `ListObjectsV2` decides whether live S3
//!   is reachable
//! - **[`namespace::LiveNamespace`]**: a fresh prefix in the live bucket,
//!   emptied on drop
//! - **[`emulator::EmulatedS3`]**: an in-process S3 server on a fixed port,
//!   with every S3 client redirected to it while it lives
//! - **[`http::MockHttpServer`]**: one file served on an ephemeral port
//! - **[`scenarios`]**: the same round-trip and WARC checks for any prefix
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serial_test::serial;
//! use strata_test::acquire_or_skip;
//! use strata_test::namespace::S3Namespace;
//! use strata_test::scenarios;
//!
//! #[tokio::test]
//! #[serial(s3)]
//! async fn round_trip_on_any_s3() {
//!     let namespace = acquire_or_skip!(S3Namespace::acquire());
//!     scenarios::round_trip(&namespace.uri()).await;
//! }
//! ```
//!
//! ## Environment
//!
//! | Variable | Meaning |
//! |---|---|
//! | `STRATA_TEST_S3_BUCKET` | Live test bucket |
//! | `STRATA_DISABLE_S3_TESTS` | Skip every S3 test |
//! | `STRATA_S3_MODE` | `auto`, `live` or `mocked` |
//! | `STRATA_EMULATOR_PORT` | Emulator port |

pub mod capability;
pub mod config;
pub mod data;
#[cfg(feature = "emulator")]
pub mod emulator;
pub mod env;
pub mod error;
pub mod gate;
pub mod http;
pub mod logging;
pub mod namespace;
pub mod runtime;
pub mod scenarios;
pub mod server;

pub use error::{HarnessError, HarnessResult};
pub use gate::{SkipDecision, SkipReason};
pub use logging::init_test_logging;
