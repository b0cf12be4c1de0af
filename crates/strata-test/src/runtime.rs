//! Driving async work from synchronous fixture code.

use std::future::Future;
use std::thread;

use crate::{HarnessError, HarnessResult};

/// Run the future produced by `make` to completion on a fresh thread with
/// its own current-thread Tokio runtime.
///
/// Fixtures use this for setup and teardown so they behave the same inside
/// `#[test]` and `#[tokio::test]` bodies, including from `Drop` while a
/// test is unwinding.
pub fn block_on_dedicated<F, Fut, T>(make: F) -> HarnessResult<T>
where
	F: FnOnce() -> Fut + Send,
	Fut: Future<Output = T>,
	T: Send,
{
	thread::scope(|scope| {
		let handle = thread::Builder::new()
			.name("strata-test-runtime".to_string())
			.spawn_scoped(scope, move || {
				let runtime = tokio::runtime::Builder::new_current_thread()
					.enable_all()
					.build()
					.map_err(|e| HarnessError::Runtime(e.to_string()))?;
				Ok(runtime.block_on(make()))
			})
			.map_err(|e| HarnessError::Runtime(e.to_string()))?;

		handle
			.join()
			.map_err(|_| HarnessError::Runtime("dedicated runtime thread panicked".to_string()))?
	})
}
