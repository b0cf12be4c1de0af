//! Per-test S3 namespaces.
//!
//! Each fixture owns a fresh `<root>/<uuid>` prefix and deletes everything
//! under it on teardown. Teardown never fails the test: errors are logged at
//! `warn` and dropped.

use uuid::Uuid;

use crate::HarnessResult;
use crate::config::HarnessSettings;
#[cfg(feature = "s3")]
use crate::config::S3Mode;
#[cfg(feature = "s3")]
use crate::gate::{SkipDecision, emulated_s3_gates, live_s3_gates};

/// Maximum keys per `DeleteObjects` request.
pub const DELETE_BATCH: usize = 1000;

/// A collision-free key prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamespacePrefix(String);

impl NamespacePrefix {
	/// `<root>/<uuid-v4 simple>`.
	pub fn generate(root: &str) -> Self {
		Self(format!(
			"{}/{}",
			root.trim_end_matches('/'),
			Uuid::new_v4().simple()
		))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl std::fmt::Display for NamespacePrefix {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

/// Namespace in the live test bucket, using ambient credentials.
#[derive(Debug)]
pub struct LiveNamespace {
	bucket: String,
	prefix: NamespacePrefix,
	cleaned: bool,
}

impl LiveNamespace {
	/// Reserve a fresh prefix in the configured bucket. No network I/O.
	pub fn acquire() -> HarnessResult<Self> {
		Ok(Self::acquire_with(&HarnessSettings::from_env()?))
	}

	pub fn acquire_with(settings: &HarnessSettings) -> Self {
		// Cached clients are bound to the runtime that built them.
		#[cfg(feature = "s3")]
		strata_storages::s3::client::clear_client_cache();

		let namespace = Self {
			bucket: settings.bucket.clone(),
			prefix: NamespacePrefix::generate(&settings.namespace_root),
			cleaned: false,
		};
		tracing::debug!(uri = %namespace.uri(), "acquired live namespace");
		namespace
	}

	/// `s3://<bucket>/<prefix>`
	pub fn uri(&self) -> String {
		format!("s3://{}/{}", self.bucket, self.prefix)
	}

	pub fn bucket(&self) -> &str {
		&self.bucket
	}

	pub fn prefix(&self) -> &NamespacePrefix {
		&self.prefix
	}

	/// Delete every object under the prefix.
	///
	/// Never panics or returns an error; safe to call repeatedly.
	pub fn cleanup(&mut self) {
		self.cleaned = true;
		cleanup_prefix(&self.bucket, self.prefix.as_str());
		#[cfg(feature = "s3")]
		strata_storages::s3::client::clear_client_cache();
	}
}

impl Drop for LiveNamespace {
	fn drop(&mut self) {
		if !self.cleaned {
			self.cleanup();
		}
	}
}

/// Best-effort deletion of `bucket/prefix/**` through the client factory.
#[cfg(feature = "s3")]
pub fn cleanup_prefix(bucket: &str, prefix: &str) {
	use strata_storages::config::S3ClientSettings;
	use strata_storages::s3::client;

	let outcome = crate::runtime::block_on_dedicated(move || async move {
		let client = client::build_client(&S3ClientSettings::from_env()).await;
		s3::delete_prefix(&client, bucket, prefix).await
	});

	match outcome {
		Ok(Ok(deleted)) => {
			tracing::debug!(%bucket, %prefix, deleted, "namespace cleaned up");
		}
		Ok(Err(err)) | Err(err) => {
			tracing::warn!(%bucket, %prefix, error = %err, "namespace cleanup failed");
		}
	}
}

#[cfg(not(feature = "s3"))]
pub fn cleanup_prefix(bucket: &str, prefix: &str) {
	tracing::debug!(%bucket, %prefix, "S3 support not compiled in; nothing to clean up");
}

#[cfg(feature = "s3")]
pub mod s3 {
	//! Prefix deletion.

	use aws_sdk_s3::Client;
	use aws_sdk_s3::error::DisplayErrorContext;
	use aws_sdk_s3::types::{Delete, ObjectIdentifier};

	use super::DELETE_BATCH;
	use crate::{HarnessError, HarnessResult};

	fn s3_error(err: impl std::error::Error) -> HarnessError {
		HarnessError::S3(DisplayErrorContext(err).to_string())
	}

	/// Delete every object whose key starts with `prefix/`.
	///
	/// Follows continuation tokens and deletes in batches of at most
	/// [`DELETE_BATCH`] keys. Returns the number of keys deleted. Per-key
	/// failures reported by `DeleteObjects` are logged and not counted.
	pub async fn delete_prefix(client: &Client, bucket: &str, prefix: &str) -> HarnessResult<usize> {
		let prefix = format!("{}/", prefix.trim_end_matches('/'));
		let mut deleted = 0;
		let mut token: Option<String> = None;

		loop {
			let page = client
				.list_objects_v2()
				.bucket(bucket)
				.prefix(&prefix)
				.set_continuation_token(token.take())
				.send()
				.await
				.map_err(s3_error)?;

			let keys: Vec<&str> = page.contents().iter().filter_map(|o| o.key()).collect();
			for batch in keys.chunks(DELETE_BATCH) {
				let objects = batch
					.iter()
					.map(|key| ObjectIdentifier::builder().key(*key).build())
					.collect::<Result<Vec<_>, _>>()
					.map_err(s3_error)?;
				let delete = Delete::builder()
					.set_objects(Some(objects))
					.quiet(true)
					.build()
					.map_err(s3_error)?;

				let output = client
					.delete_objects()
					.bucket(bucket)
					.delete(delete)
					.send()
					.await
					.map_err(s3_error)?;

				for error in output.errors() {
					tracing::warn!(
						key = error.key().unwrap_or_default(),
						code = error.code().unwrap_or_default(),
						"failed to delete object"
					);
				}
				deleted += batch.len().saturating_sub(output.errors().len());
			}

			match page.next_continuation_token() {
				Some(next) if page.is_truncated().unwrap_or(false) => token = Some(next.to_string()),
				_ => break,
			}
		}

		Ok(deleted)
	}
}

/// A namespace on whichever S3 backend is available.
///
/// `STRATA_S3_MODE=auto` (the default) uses live S3 when every live gate
/// passes and the emulator otherwise; `live` and `mocked` force one side.
#[cfg(feature = "s3")]
#[derive(Debug)]
pub enum S3Namespace {
	Live(LiveNamespace),
	#[cfg(feature = "emulator")]
	Emulated(crate::emulator::EmulatedS3),
}

#[cfg(feature = "s3")]
impl S3Namespace {
	/// Select a backend and reserve a namespace on it.
	///
	/// # Errors
	///
	/// `HarnessError::Skipped` when no backend's gates pass; setup errors
	/// otherwise.
	pub fn acquire() -> HarnessResult<Self> {
		let settings = HarnessSettings::from_env()?;
		match settings.mode {
			S3Mode::Live => Self::live(&settings),
			S3Mode::Mocked => Self::emulated(&settings),
			S3Mode::Auto => match live_s3_gates().evaluate()? {
				SkipDecision::Run => Ok(S3Namespace::Live(LiveNamespace::acquire_with(&settings))),
				SkipDecision::Skip(reason) => {
					tracing::debug!(%reason, "live S3 unavailable, using emulator");
					Self::emulated(&settings)
				}
			},
		}
	}

	fn live(settings: &HarnessSettings) -> HarnessResult<Self> {
		match live_s3_gates().evaluate()? {
			SkipDecision::Run => Ok(S3Namespace::Live(LiveNamespace::acquire_with(settings))),
			SkipDecision::Skip(reason) => Err(crate::HarnessError::Skipped(reason)),
		}
	}

	fn emulated(settings: &HarnessSettings) -> HarnessResult<Self> {
		match emulated_s3_gates().evaluate()? {
			SkipDecision::Skip(reason) => Err(crate::HarnessError::Skipped(reason)),
			#[cfg(feature = "emulator")]
			SkipDecision::Run => {
				crate::emulator::EmulatedS3::start_with(settings).map(S3Namespace::Emulated)
			}
			#[cfg(not(feature = "emulator"))]
			SkipDecision::Run => {
				let _ = settings;
				Err(crate::HarnessError::Skipped(crate::gate::SkipReason(
					crate::gate::EMULATOR_REASON,
				)))
			}
		}
	}

	/// URI prefix to hand to scenarios.
	pub fn uri(&self) -> String {
		match self {
			S3Namespace::Live(namespace) => namespace.uri(),
			#[cfg(feature = "emulator")]
			S3Namespace::Emulated(emulator) => emulator.uri(),
		}
	}

	pub fn is_live(&self) -> bool {
		matches!(self, S3Namespace::Live(_))
	}
}
