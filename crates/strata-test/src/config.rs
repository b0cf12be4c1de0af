//! Harness configuration from environment variables.

use std::env;
use std::str::FromStr;

use crate::{HarnessError, HarnessResult};

/// Bucket used for live S3 tests.
pub const BUCKET_VAR: &str = "STRATA_TEST_S3_BUCKET";
/// Any non-empty value disables S3 tests.
pub const DISABLE_VAR: &str = "STRATA_DISABLE_S3_TESTS";
/// `auto`, `live` or `mocked`.
pub const MODE_VAR: &str = "STRATA_S3_MODE";
/// Fixed port the emulator binds.
pub const EMULATOR_PORT_VAR: &str = "STRATA_EMULATOR_PORT";

pub const DEFAULT_BUCKET: &str = "commoncrawl-ci-temp";
pub const DEFAULT_EMULATOR_PORT: u16 = 5555;
pub const DEFAULT_NAMESPACE_ROOT: &str = "strata/ci/tmpdirs";

/// Which S3 backend namespaced tests run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum S3Mode {
	/// Live when reachable, emulated otherwise
	#[default]
	Auto,
	/// Live only; skip if unavailable
	Live,
	/// Emulator only
	Mocked,
}

impl FromStr for S3Mode {
	type Err = HarnessError;

	fn from_str(s: &str) -> HarnessResult<Self> {
		match s.trim().to_lowercase().as_str() {
			"" | "auto" => Ok(S3Mode::Auto),
			"live" => Ok(S3Mode::Live),
			"mocked" | "mock" | "emulated" => Ok(S3Mode::Mocked),
			other => Err(HarnessError::Config(format!(
				"invalid {}: {}",
				MODE_VAR, other
			))),
		}
	}
}

/// Harness settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessSettings {
	pub bucket: String,
	pub s3_disabled: bool,
	pub mode: S3Mode,
	pub emulator_port: u16,
	pub namespace_root: String,
}

impl Default for HarnessSettings {
	fn default() -> Self {
		Self {
			bucket: DEFAULT_BUCKET.to_string(),
			s3_disabled: false,
			mode: S3Mode::Auto,
			emulator_port: DEFAULT_EMULATOR_PORT,
			namespace_root: DEFAULT_NAMESPACE_ROOT.to_string(),
		}
	}
}

impl HarnessSettings {
	/// Load settings from environment variables.
	///
	/// # Environment Variables
	///
	/// - `STRATA_TEST_S3_BUCKET`: live test bucket (default `commoncrawl-ci-temp`)
	/// - `STRATA_DISABLE_S3_TESTS`: any non-empty value disables S3 tests
	/// - `STRATA_S3_MODE`: `auto` (default), `live` or `mocked`
	/// - `STRATA_EMULATOR_PORT`: emulator port (default 5555)
	pub fn from_env() -> HarnessResult<Self> {
		let mut settings = Self::default();

		if let Some(bucket) = env::var(BUCKET_VAR).ok().filter(|v| !v.is_empty()) {
			settings.bucket = bucket;
		}
		settings.s3_disabled = env::var_os(DISABLE_VAR).is_some_and(|v| !v.is_empty());
		if let Ok(mode) = env::var(MODE_VAR) {
			settings.mode = mode.parse()?;
		}
		if let Ok(port) = env::var(EMULATOR_PORT_VAR) {
			settings.emulator_port = port.parse().map_err(|e| {
				HarnessError::Config(format!("invalid {}: {}", EMULATOR_PORT_VAR, e))
			})?;
		}

		Ok(settings)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::env::EnvGuard;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[case("auto", S3Mode::Auto)]
	#[case("", S3Mode::Auto)]
	#[case("LIVE", S3Mode::Live)]
	#[case("mocked", S3Mode::Mocked)]
	fn parses_mode(#[case] input: &str, #[case] expected: S3Mode) {
		assert_eq!(input.parse::<S3Mode>().unwrap(), expected);
	}

	#[rstest]
	#[serial(s3)]
	fn defaults_when_unset() {
		let mut env = EnvGuard::new();
		env.remove(BUCKET_VAR);
		env.remove(DISABLE_VAR);
		env.remove(MODE_VAR);
		env.remove(EMULATOR_PORT_VAR);

		assert_eq!(HarnessSettings::from_env().unwrap(), HarnessSettings::default());
	}

	#[rstest]
	#[serial(s3)]
	fn reads_overrides() {
		let mut env = EnvGuard::new();
		env.set(BUCKET_VAR, "my-bucket");
		env.set(DISABLE_VAR, "0");
		env.set(MODE_VAR, "mocked");
		env.set(EMULATOR_PORT_VAR, "6000");

		let settings = HarnessSettings::from_env().unwrap();
		assert_eq!(settings.bucket, "my-bucket");
		// Any non-empty value disables, even "0".
		assert!(settings.s3_disabled);
		assert_eq!(settings.mode, S3Mode::Mocked);
		assert_eq!(settings.emulator_port, 6000);
	}

	#[rstest]
	#[serial(s3)]
	fn empty_disable_switch_is_ignored() {
		let mut env = EnvGuard::new();
		env.set(DISABLE_VAR, "");
		assert!(!HarnessSettings::from_env().unwrap().s3_disabled);
	}
}
