//! In-process S3 emulator fixture.
//!
//! [`EmulatedS3`] serves a real S3 HTTP API from memory on a fixed local
//! port and redirects every client built by
//! [`strata_storages::s3::client`] to it for as long as it lives.

pub mod service;
pub mod xml;

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use aws_sdk_s3::error::DisplayErrorContext;
use strata_storages::config::S3ClientSettings;
use strata_storages::s3::client::{self, DEFAULT_REGION, EndpointOverride, EndpointOverrideGuard};

use crate::config::HarnessSettings;
use crate::env::EnvGuard;
use crate::namespace::{NamespacePrefix, cleanup_prefix};
use crate::server::BackgroundServer;
use crate::{HarnessError, HarnessResult};

pub use service::{EmulatorState, S3Service};

/// Credential and region variables replaced while the emulator runs.
///
/// The emulator does not check signatures, but the SDK refuses to sign
/// without credentials.
pub const PLACEHOLDER_CREDENTIALS: &[(&str, &str)] = &[
	("AWS_ACCESS_KEY_ID", "testing"),
	("AWS_SECRET_ACCESS_KEY", "testing"),
	("AWS_SESSION_TOKEN", "testing"),
	("AWS_SECURITY_TOKEN", "testing"),
	("AWS_REGION", DEFAULT_REGION),
	("AWS_DEFAULT_REGION", DEFAULT_REGION),
];

/// A running emulator plus a fresh namespace in its test bucket.
///
/// Tests using it must be `#[serial(s3)]`: the port, the process
/// environment and the client override are process-wide.
pub struct EmulatedS3 {
	bucket: String,
	prefix: NamespacePrefix,
	state: Arc<EmulatorState>,
	server: BackgroundServer,
	endpoint: Option<EndpointOverrideGuard>,
	env: Option<EnvGuard>,
}

impl EmulatedS3 {
	/// Start the emulator with settings from the environment.
	pub fn start() -> HarnessResult<Self> {
		Self::start_with(&HarnessSettings::from_env()?)
	}

	/// Start the emulator on `settings.emulator_port` and create
	/// `settings.bucket` in it.
	///
	/// # Errors
	///
	/// [`HarnessError::EmulatorBind`] when the port is taken (typically a
	/// leaked server from an earlier run), [`HarnessError::BucketSetup`] when
	/// the bucket cannot be created.
	pub fn start_with(settings: &HarnessSettings) -> HarnessResult<Self> {
		client::clear_client_cache();

		let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, settings.emulator_port));
		let state = Arc::new(EmulatorState::default());
		let server = BackgroundServer::start(addr, Arc::new(S3Service::new(Arc::clone(&state))))
			.map_err(|source| HarnessError::EmulatorBind { addr, source })?;
		let endpoint_url = format!("http://{}", server.local_addr());

		let mut env = EnvGuard::new();
		for (key, value) in PLACEHOLDER_CREDENTIALS {
			env.set(key, value);
		}

		create_bucket(&endpoint_url, &settings.bucket)?;

		let endpoint = client::override_endpoint(
			EndpointOverride::new(endpoint_url.clone()).with_region(DEFAULT_REGION),
		);

		let emulator = Self {
			bucket: settings.bucket.clone(),
			prefix: NamespacePrefix::generate(&settings.namespace_root),
			state,
			server,
			endpoint: Some(endpoint),
			env: Some(env),
		};
		tracing::info!(endpoint = %endpoint_url, uri = %emulator.uri(), "S3 emulator started");
		Ok(emulator)
	}

	/// `s3://<bucket>/<prefix>`
	pub fn uri(&self) -> String {
		format!("s3://{}/{}", self.bucket, self.prefix)
	}

	/// `http://127.0.0.1:<port>`
	pub fn endpoint_url(&self) -> String {
		format!("http://{}", self.server.local_addr())
	}

	pub fn bucket(&self) -> &str {
		&self.bucket
	}

	pub fn prefix(&self) -> &NamespacePrefix {
		&self.prefix
	}

	/// Keys currently stored in the test bucket.
	pub fn object_keys(&self) -> Vec<String> {
		self.state.keys(&self.bucket)
	}

	/// Delete everything under the namespace prefix through the SDK.
	pub fn cleanup(&self) {
		cleanup_prefix(&self.bucket, self.prefix.as_str());
	}
}

fn create_bucket(endpoint_url: &str, bucket: &str) -> HarnessResult<()> {
	let settings = S3ClientSettings {
		region: Some(DEFAULT_REGION.to_string()),
		endpoint: Some(endpoint_url.to_string()),
		force_path_style: true,
		..Default::default()
	};
	let bucket_name = bucket.to_string();

	let created = crate::runtime::block_on_dedicated(move || async move {
		let client = client::build_client(&settings).await;
		client
			.create_bucket()
			.bucket(&bucket_name)
			.send()
			.await
			.map(|_| ())
			.map_err(|e| DisplayErrorContext(e).to_string())
	})?;

	created.map_err(|message| HarnessError::BucketSetup {
		bucket: bucket.to_string(),
		message,
	})
}

impl fmt::Debug for EmulatedS3 {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("EmulatedS3")
			.field("bucket", &self.bucket)
			.field("prefix", &self.prefix)
			.field("addr", &self.server.local_addr())
			.finish_non_exhaustive()
	}
}

impl Drop for EmulatedS3 {
	fn drop(&mut self) {
		self.server.stop();
		client::clear_client_cache();
		drop(self.endpoint.take());
		drop(self.env.take());
		tracing::info!(bucket = %self.bucket, "S3 emulator stopped");
	}
}
