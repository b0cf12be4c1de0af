//! Test logging utilities.
//!
//! Harness code logs through `tracing`; with its `log` feature enabled and no
//! subscriber installed, events are forwarded to the `log` facade, which
//! `env_logger` prints. Use `RUST_LOG=strata_test=debug` to follow fixture
//! setup and teardown.

use std::sync::Once;

static INIT: Once = Once::new();

/// Initialize logging for tests (call once)
///
/// Safe to call from every test; only the first call installs the logger.
///
/// # Examples
///
/// ```
/// use strata_test::logging::init_test_logging;
///
/// init_test_logging();
/// ```
pub fn init_test_logging() {
	INIT.call_once(|| {
		let _ = env_logger::builder().is_test(true).try_init();
	});
}
