//! Skip gates.
//!
//! Rust's test harness has no runtime skip, so a gated test evaluates its
//! gates first and returns early (printing why) when one fails:
//!
//! ```rust,no_run
//! use strata_test::gate::live_s3_gates;
//! use strata_test::skip_unless;
//!
//! #[test]
//! fn reads_from_live_bucket() {
//!     skip_unless!(live_s3_gates());
//!     // ...
//! }
//! ```

use std::fmt;

use crate::HarnessResult;
use crate::config::HarnessSettings;

pub const DISABLED_REASON: &str = "S3 test disabled via environment variable.";
pub const DEPENDENCIES_REASON: &str = "S3 dependencies are not installed.";
pub const INACCESSIBLE_REASON: &str = "S3 not accessible (no credentials or permissions)";
pub const EMULATOR_REASON: &str = "S3 emulator dependencies are not installed.";

/// Why a test was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkipReason(pub &'static str);

impl fmt::Display for SkipReason {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.0)
	}
}

/// Outcome of evaluating a [`GateRunner`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipDecision {
	Run,
	Skip(SkipReason),
}

type Check = Box<dyn Fn() -> HarnessResult<bool> + Send + Sync>;

/// A named prerequisite. The check returns `Ok(true)` when satisfied.
pub struct Gate {
	reason: &'static str,
	check: Check,
}

impl Gate {
	pub fn new<F>(reason: &'static str, check: F) -> Self
	where
		F: Fn() -> HarnessResult<bool> + Send + Sync + 'static,
	{
		Self {
			reason,
			check: Box::new(check),
		}
	}

	pub fn reason(&self) -> &'static str {
		self.reason
	}
}

impl fmt::Debug for Gate {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Gate").field("reason", &self.reason).finish()
	}
}

/// Ordered list of gates; the first failing gate decides.
#[derive(Debug, Default)]
pub struct GateRunner {
	gates: Vec<Gate>,
}

impl GateRunner {
	pub fn new() -> Self {
		Self::default()
	}

	/// Append a gate.
	pub fn gate<F>(mut self, reason: &'static str, check: F) -> Self
	where
		F: Fn() -> HarnessResult<bool> + Send + Sync + 'static,
	{
		self.gates.push(Gate::new(reason, check));
		self
	}

	/// Evaluate gates in order, stopping at the first failure.
	///
	/// # Errors
	///
	/// A gate's error aborts evaluation; later gates are not run.
	pub fn evaluate(&self) -> HarnessResult<SkipDecision> {
		for gate in &self.gates {
			if !(gate.check)()? {
				return Ok(SkipDecision::Skip(SkipReason(gate.reason)));
			}
		}
		Ok(SkipDecision::Run)
	}
}

fn not_disabled() -> HarnessResult<bool> {
	Ok(!HarnessSettings::from_env()?.s3_disabled)
}

/// Gates for tests against live S3: disable switch, client compiled in,
/// capability probe.
pub fn live_s3_gates() -> GateRunner {
	GateRunner::new()
		.gate(DISABLED_REASON, not_disabled)
		.gate(DEPENDENCIES_REASON, || Ok(cfg!(feature = "s3")))
		.gate(INACCESSIBLE_REASON, crate::capability::live_s3_available)
}

/// Gates for tests against the in-process emulator.
pub fn emulated_s3_gates() -> GateRunner {
	GateRunner::new()
		.gate(DISABLED_REASON, not_disabled)
		.gate(EMULATOR_REASON, || Ok(cfg!(feature = "emulator")))
}

/// Log and print a skip. Used by [`skip_unless!`](crate::skip_unless) and
/// [`acquire_or_skip!`](crate::acquire_or_skip).
pub fn report_skip(reason: &SkipReason) {
	let current = std::thread::current();
	let test = current.name().unwrap_or("<unnamed>");
	tracing::info!(%test, %reason, "skipping test");
	println!("SKIPPED {}: {}", test, reason);
}

/// Return early from the enclosing test when any gate fails.
///
/// Panics if a gate reports an error, since that is a harness failure
/// rather than a missing prerequisite.
#[macro_export]
macro_rules! skip_unless {
	($gates:expr) => {
		match $gates.evaluate() {
			Ok($crate::gate::SkipDecision::Run) => {}
			Ok($crate::gate::SkipDecision::Skip(reason)) => {
				$crate::gate::report_skip(&reason);
				return;
			}
			Err(err) => panic!("prerequisite check failed: {}", err),
		}
	};
}

/// Unwrap a fixture, returning early from the test if it was skipped.
///
/// ```rust,no_run
/// use strata_test::acquire_or_skip;
/// use strata_test::namespace::S3Namespace;
///
/// #[test]
/// fn writes_somewhere() {
///     let namespace = acquire_or_skip!(S3Namespace::acquire());
///     // ...
/// }
/// ```
#[macro_export]
macro_rules! acquire_or_skip {
	($fixture:expr) => {
		match $fixture {
			Ok(value) => value,
			Err($crate::HarnessError::Skipped(reason)) => {
				$crate::gate::report_skip(&reason);
				return;
			}
			Err(err) => panic!("fixture setup failed: {}", err),
		}
	};
}
