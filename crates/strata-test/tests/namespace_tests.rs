//! Backend selection for `S3Namespace`.

#![cfg(feature = "emulator")]

use rstest::rstest;
use serial_test::serial;
use strata_test::config::{DISABLE_VAR, MODE_VAR};
use strata_test::env::EnvGuard;
use strata_test::gate::DISABLED_REASON;
use strata_test::namespace::S3Namespace;
use strata_test::{HarnessError, SkipReason, acquire_or_skip, scenarios};

#[rstest]
#[tokio::test]
#[serial(s3)]
async fn mocked_mode_uses_emulator() {
	let mut env = EnvGuard::new();
	env.set(MODE_VAR, "mocked");
	env.remove(DISABLE_VAR);

	let namespace = acquire_or_skip!(S3Namespace::acquire());
	assert!(!namespace.is_live());
	scenarios::round_trip(&namespace.uri()).await;
	drop(namespace);
}

#[rstest]
#[tokio::test]
#[serial(s3)]
async fn auto_mode_works_on_either_backend() {
	let mut env = EnvGuard::new();
	env.set(MODE_VAR, "auto");
	env.remove(DISABLE_VAR);

	let namespace = acquire_or_skip!(S3Namespace::acquire());
	scenarios::round_trip(&namespace.uri()).await;
	drop(namespace);
}

#[rstest]
#[serial(s3)]
fn disable_switch_skips_every_mode() {
	let mut env = EnvGuard::new();
	env.set(DISABLE_VAR, "1");

	for mode in ["auto", "live", "mocked"] {
		env.set(MODE_VAR, mode);
		match S3Namespace::acquire() {
			Err(HarnessError::Skipped(reason)) => assert_eq!(reason, SkipReason(DISABLED_REASON)),
			other => panic!("{} mode: expected skip, got {:?}", mode, other),
		}
	}
}

#[rstest]
#[serial(s3)]
fn invalid_mode_is_a_config_error() {
	let mut env = EnvGuard::new();
	env.set(MODE_VAR, "sometimes");

	assert!(matches!(S3Namespace::acquire(), Err(HarnessError::Config(_))));
}
