//! Process-wide detection of live S3 access.
//!
//! The probe is a single `ListObjectsV2` call with one attempt and a short
//! timeout. Its result is computed at most once per process and then reused
//! by every gate; a probe that fails with an unexpected error is not cached.

use once_cell::sync::OnceCell;

use crate::HarnessResult;

/// Memoized capability state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityFlag {
	/// Not probed yet, or the last probe failed unexpectedly
	Unknown,
	Available,
	Unavailable,
}

/// At-most-once capability check.
pub struct CapabilityProber<F> {
	cell: OnceCell<bool>,
	check: F,
}

impl<F> CapabilityProber<F>
where
	F: Fn() -> HarnessResult<bool>,
{
	pub const fn new(check: F) -> Self {
		Self {
			cell: OnceCell::new(),
			check,
		}
	}

	/// Run the check on first call; return the cached answer afterwards.
	///
	/// # Errors
	///
	/// Propagates errors the check could not classify. Nothing is cached in
	/// that case, so the next call probes again.
	pub fn probe(&self) -> HarnessResult<bool> {
		self.cell
			.get_or_try_init(|| {
				let available = (self.check)()?;
				tracing::debug!(available, "capability probe resolved");
				Ok(available)
			})
			.copied()
	}

	/// Current state without probing.
	pub fn state(&self) -> CapabilityFlag {
		match self.cell.get() {
			None => CapabilityFlag::Unknown,
			Some(true) => CapabilityFlag::Available,
			Some(false) => CapabilityFlag::Unavailable,
		}
	}
}

/// Live S3 reachability for the configured test bucket.
pub static LIVE_S3: CapabilityProber<fn() -> HarnessResult<bool>> =
	CapabilityProber::new(probe_live_s3 as fn() -> HarnessResult<bool>);

/// Shorthand for `LIVE_S3.probe()`.
pub fn live_s3_available() -> HarnessResult<bool> {
	LIVE_S3.probe()
}

/// Probe live S3 once, without caching.
///
/// # Errors
///
/// `HarnessError::Probe` while an endpoint override is installed: the
/// environment then holds placeholder credentials, so no answer would
/// describe the live backend.
#[cfg(feature = "s3")]
pub fn probe_live_s3() -> HarnessResult<bool> {
	if let Some(endpoint) = strata_storages::s3::client::current_override() {
		return Err(crate::HarnessError::Probe(format!(
			"cannot probe live S3 while clients are redirected to {}",
			endpoint.endpoint_url
		)));
	}
	let settings = crate::config::HarnessSettings::from_env()?;
	crate::runtime::block_on_dedicated(move || async move {
		s3::check_bucket_access(&settings.bucket).await
	})?
}

#[cfg(not(feature = "s3"))]
pub fn probe_live_s3() -> HarnessResult<bool> {
	Ok(false)
}

#[cfg(feature = "s3")]
pub mod s3 {
	//! The S3 side of the probe.

	use std::time::Duration;

	use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
	use strata_storages::config::S3ClientSettings;
	use strata_storages::s3::client;

	use crate::{HarnessError, HarnessResult};

	/// Connect and operation timeout of the probe.
	pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

	/// List at most one key in `bucket` with a single attempt.
	///
	/// Returns `Ok(false)` for missing credentials or region, access errors,
	/// unreachable endpoints and timeouts.
	pub async fn check_bucket_access(bucket: &str) -> HarnessResult<bool> {
		let settings = S3ClientSettings::from_env().probe(PROBE_TIMEOUT);
		let client = client::build_client_direct(&settings).await;

		match client.list_objects_v2().bucket(bucket).max_keys(1).send().await {
			Ok(_) => Ok(true),
			Err(err) => classify(err),
		}
	}

	fn classify<E, R>(err: SdkError<E, R>) -> HarnessResult<bool>
	where
		E: std::error::Error + Send + Sync + 'static,
		R: std::fmt::Debug,
	{
		match &err {
			SdkError::ConstructionFailure(_)
			| SdkError::DispatchFailure(_)
			| SdkError::TimeoutError(_)
			| SdkError::ServiceError(_) => {
				tracing::debug!(error = %DisplayErrorContext(&err), "live S3 not accessible");
				Ok(false)
			}
			_ => Err(HarnessError::Probe(DisplayErrorContext(&err).to_string())),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::HarnessError;
	use rstest::rstest;
	use std::sync::atomic::{AtomicUsize, Ordering};

	#[rstest]
	fn probes_at_most_once() {
		let calls = AtomicUsize::new(0);
		let prober = CapabilityProber::new(|| {
			calls.fetch_add(1, Ordering::SeqCst);
			Ok(true)
		});

		assert_eq!(prober.state(), CapabilityFlag::Unknown);
		for _ in 0..5 {
			assert!(prober.probe().unwrap());
		}
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(prober.state(), CapabilityFlag::Available);
	}

	#[rstest]
	fn caches_unavailable_too() {
		let calls = AtomicUsize::new(0);
		let prober = CapabilityProber::new(|| {
			calls.fetch_add(1, Ordering::SeqCst);
			Ok(false)
		});

		assert!(!prober.probe().unwrap());
		assert!(!prober.probe().unwrap());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(prober.state(), CapabilityFlag::Unavailable);
	}

	#[rstest]
	fn unexpected_errors_are_not_cached() {
		let calls = AtomicUsize::new(0);
		let prober = CapabilityProber::new(|| {
			if calls.fetch_add(1, Ordering::SeqCst) == 0 {
				Err(HarnessError::Probe("unparseable response".to_string()))
			} else {
				Ok(true)
			}
		});

		assert!(matches!(prober.probe(), Err(HarnessError::Probe(_))));
		assert_eq!(prober.state(), CapabilityFlag::Unknown);
		assert!(prober.probe().unwrap());
		assert_eq!(calls.load(Ordering::SeqCst), 2);
	}

	#[rstest]
	fn concurrent_callers_share_one_probe() {
		let calls = AtomicUsize::new(0);
		let prober = CapabilityProber::new(|| {
			calls.fetch_add(1, Ordering::SeqCst);
			std::thread::sleep(std::time::Duration::from_millis(20));
			Ok(true)
		});

		std::thread::scope(|s| {
			for _ in 0..8 {
				s.spawn(|| assert!(prober.probe().unwrap()));
			}
		});
		assert_eq!(calls.load(Ordering::SeqCst), 1);
	}

	#[cfg(feature = "s3")]
	#[rstest]
	#[serial_test::serial(s3)]
	fn live_check_is_refused_through_an_endpoint_override() {
		use strata_storages::s3::client::{EndpointOverride, override_endpoint};

		let prober = CapabilityProber::new(probe_live_s3);
		{
			let _redirect = override_endpoint(EndpointOverride::new("http://127.0.0.1:5555"));
			assert!(matches!(prober.probe(), Err(HarnessError::Probe(_))));
		}
		assert_eq!(prober.state(), CapabilityFlag::Unknown);
	}
}
