//! Scoped environment variable overrides.

use std::env;
use std::ffi::OsString;

/// RAII guard for environment variables.
///
/// Every variable touched through the guard is restored to its previous value
/// (or removed, if it was unset) when the guard drops, in reverse order.
///
/// The process environment is shared by every test thread, so tests using
/// this guard must be serialized (`#[serial]`).
#[derive(Debug, Default)]
pub struct EnvGuard {
	saved: Vec<(String, Option<OsString>)>,
}

impl EnvGuard {
	pub fn new() -> Self {
		Self::default()
	}

	/// Set `key` to `value` for the lifetime of the guard.
	pub fn set(&mut self, key: &str, value: &str) {
		self.saved.push((key.to_string(), env::var_os(key)));
		// SAFETY: callers serialize environment access across tests.
		unsafe {
			env::set_var(key, value);
		}
	}

	/// Remove `key` for the lifetime of the guard.
	pub fn remove(&mut self, key: &str) {
		self.saved.push((key.to_string(), env::var_os(key)));
		// SAFETY: callers serialize environment access across tests.
		unsafe {
			env::remove_var(key);
		}
	}
}

impl Drop for EnvGuard {
	fn drop(&mut self) {
		for (key, previous) in self.saved.drain(..).rev() {
			// SAFETY: see `EnvGuard::set`.
			unsafe {
				match previous {
					Some(value) => env::set_var(&key, value),
					None => env::remove_var(&key),
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use serial_test::serial;

	#[rstest]
	#[serial(s3)]
	fn restores_previous_values() {
		let key = "STRATA_TEST_ENV_GUARD_PROBE";
		// SAFETY: serialized.
		unsafe { env::set_var(key, "before") };

		{
			let mut guard = EnvGuard::new();
			guard.set(key, "first");
			guard.set(key, "second");
			assert_eq!(env::var(key).unwrap(), "second");
		}

		assert_eq!(env::var(key).unwrap(), "before");
		unsafe { env::remove_var(key) };
	}

	#[rstest]
	#[serial(s3)]
	fn removes_variables_that_were_unset() {
		let key = "STRATA_TEST_ENV_GUARD_UNSET";
		{
			let mut guard = EnvGuard::new();
			guard.set(key, "value");
		}
		assert!(env::var_os(key).is_none());
	}
}
