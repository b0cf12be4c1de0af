//! S3 support: client construction and error mapping.

pub mod client;

use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};

use crate::StorageError;

/// Map an SDK error onto the storage error taxonomy.
pub(crate) fn map_sdk_error<E>(err: SdkError<E>, name: &str) -> StorageError
where
	E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
{
	match err.code() {
		Some("NoSuchKey") | Some("NotFound") | Some("NoSuchBucket") => {
			StorageError::NotFound(name.to_string())
		}
		Some("AccessDenied") | Some("Forbidden") | Some("InvalidAccessKeyId") => {
			StorageError::PermissionDenied(name.to_string())
		}
		_ => StorageError::NetworkError(format!("{}", DisplayErrorContext(&err))),
	}
}
