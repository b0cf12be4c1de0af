//! S3 client factory.
//!
//! Every S3 client the crate uses is built here, so there is exactly one
//! place that decides which endpoint a client talks to:
//!
//! - [`build_client`] always constructs a fresh client.
//! - [`shared_client`] hands out a process-wide cached client, rebuilt when
//!   the effective settings change.
//! - [`override_endpoint`] installs a scoped endpoint override. While the
//!   returned guard lives, every client built by this module targets the
//!   override endpoint with path-style addressing, whatever the caller asked
//!   for. Dropping the guard restores the previous override.
//!
//! Test harnesses use the override to point all traffic at an emulator and
//! [`clear_client_cache`] to make sure no cached client outlives it.

use std::sync::{Mutex, PoisonError, RwLock};

use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::Region;

use crate::config::S3ClientSettings;

/// Region used when neither settings nor the SDK provider chain name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// Endpoint that replaces whatever endpoint a caller configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointOverride {
	/// Endpoint URL, e.g. `http://127.0.0.1:5555`
	pub endpoint_url: String,
	/// Region to force alongside the endpoint
	pub region: Option<String>,
}

impl EndpointOverride {
	/// Override pointing at `endpoint_url` with no forced region.
	pub fn new(endpoint_url: impl Into<String>) -> Self {
		Self {
			endpoint_url: endpoint_url.into(),
			region: None,
		}
	}

	/// Also force the signing region.
	pub fn with_region(mut self, region: impl Into<String>) -> Self {
		self.region = Some(region.into());
		self
	}
}

struct CachedClient {
	settings: S3ClientSettings,
	client: Client,
}

static ENDPOINT_OVERRIDE: RwLock<Option<EndpointOverride>> = RwLock::new(None);
static CLIENT_CACHE: Mutex<Option<CachedClient>> = Mutex::new(None);

/// Guard for a scoped endpoint override.
///
/// Restores the override that was active before [`override_endpoint`] was
/// called when dropped, so overrides nest.
#[must_use = "the override is removed as soon as the guard is dropped"]
#[derive(Debug)]
pub struct EndpointOverrideGuard {
	previous: Option<EndpointOverride>,
}

impl Drop for EndpointOverrideGuard {
	fn drop(&mut self) {
		let mut current = ENDPOINT_OVERRIDE
			.write()
			.unwrap_or_else(PoisonError::into_inner);
		tracing::debug!(restored = ?self.previous, "removing S3 endpoint override");
		*current = self.previous.take();
	}
}

/// Force every client built while the guard lives onto `endpoint`.
pub fn override_endpoint(endpoint: EndpointOverride) -> EndpointOverrideGuard {
	let mut current = ENDPOINT_OVERRIDE
		.write()
		.unwrap_or_else(PoisonError::into_inner);
	tracing::debug!(endpoint = %endpoint.endpoint_url, "installing S3 endpoint override");
	let previous = current.replace(endpoint);
	EndpointOverrideGuard { previous }
}

/// The endpoint override currently in force, if any.
pub fn current_override() -> Option<EndpointOverride> {
	ENDPOINT_OVERRIDE
		.read()
		.unwrap_or_else(PoisonError::into_inner)
		.clone()
}

/// Apply the active override (if any) to `settings`.
///
/// The result is exactly what [`build_client`] would configure.
pub fn resolve(settings: &S3ClientSettings) -> S3ClientSettings {
	let mut resolved = settings.clone();
	if let Some(endpoint) = current_override() {
		resolved.endpoint = Some(endpoint.endpoint_url);
		resolved.force_path_style = true;
		if endpoint.region.is_some() {
			resolved.region = endpoint.region;
		}
	}
	resolved
}

/// Build a fresh client for `settings`, honoring the endpoint override.
pub async fn build_client(settings: &S3ClientSettings) -> Client {
	build_resolved(&resolve(settings)).await
}

/// Build a fresh client for exactly `settings`, ignoring any active
/// endpoint override.
///
/// For callers that must reach the configured endpoint even while an
/// emulator has redirected everything else.
pub async fn build_client_direct(settings: &S3ClientSettings) -> Client {
	build_resolved(settings).await
}

/// Return the process-wide cached client, building it on first use.
///
/// The cache holds a single client. It is replaced when the effective
/// settings (after applying the override) differ from the cached ones.
pub async fn shared_client(settings: &S3ClientSettings) -> Client {
	let resolved = resolve(settings);

	{
		let cache = CLIENT_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
		if let Some(cached) = cache.as_ref().filter(|c| c.settings == resolved) {
			return cached.client.clone();
		}
	}

	let client = build_resolved(&resolved).await;
	let mut cache = CLIENT_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
	*cache = Some(CachedClient {
		settings: resolved,
		client: client.clone(),
	});
	client
}

/// Drop the cached client, if any.
pub fn clear_client_cache() {
	let mut cache = CLIENT_CACHE.lock().unwrap_or_else(PoisonError::into_inner);
	if cache.take().is_some() {
		tracing::debug!("cleared cached S3 client");
	}
}

/// Whether a client is currently cached.
pub fn has_cached_client() -> bool {
	CLIENT_CACHE
		.lock()
		.unwrap_or_else(PoisonError::into_inner)
		.is_some()
}

async fn build_resolved(settings: &S3ClientSettings) -> Client {
	let region = RegionProviderChain::first_try(settings.region.clone().map(Region::new))
		.or_default_provider()
		.or_else(DEFAULT_REGION);

	let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region);
	if let Some(attempts) = settings.max_attempts {
		loader = loader.retry_config(RetryConfig::standard().with_max_attempts(attempts));
	}
	if let Some(timeout) = settings.timeout {
		loader = loader.timeout_config(
			TimeoutConfig::builder()
				.connect_timeout(timeout)
				.operation_timeout(timeout)
				.build(),
		);
	}
	let sdk_config = loader.load().await;

	let mut builder =
		aws_sdk_s3::config::Builder::from(&sdk_config).force_path_style(settings.force_path_style);
	if let Some(endpoint) = &settings.endpoint {
		builder = builder.endpoint_url(endpoint);
	}

	tracing::debug!(
		endpoint = settings.endpoint.as_deref().unwrap_or("<default>"),
		path_style = settings.force_path_style,
		"built S3 client"
	);
	Client::from_conf(builder.build())
}
