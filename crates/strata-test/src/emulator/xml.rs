//! S3 XML request and response bodies.

use serde::{Deserialize, Serialize};

/// `ListBucketResult` response (ListObjectsV2).
#[derive(Debug, Serialize)]
#[serde(rename = "ListBucketResult")]
pub struct ListObjectsV2Response {
	#[serde(rename = "Name")]
	pub name: String,
	#[serde(rename = "Prefix")]
	pub prefix: String,
	#[serde(rename = "MaxKeys")]
	pub max_keys: usize,
	#[serde(rename = "EncodingType", skip_serializing_if = "Option::is_none")]
	pub encoding_type: Option<String>,
	#[serde(rename = "IsTruncated")]
	pub is_truncated: bool,
	#[serde(rename = "ContinuationToken", skip_serializing_if = "Option::is_none")]
	pub continuation_token: Option<String>,
	#[serde(rename = "NextContinuationToken", skip_serializing_if = "Option::is_none")]
	pub next_continuation_token: Option<String>,
	#[serde(rename = "StartAfter", skip_serializing_if = "Option::is_none")]
	pub start_after: Option<String>,
	#[serde(rename = "KeyCount")]
	pub key_count: usize,
	#[serde(rename = "Contents", default)]
	pub contents: Vec<ObjectEntry>,
}

/// Object entry in a list response.
#[derive(Debug, Serialize)]
pub struct ObjectEntry {
	#[serde(rename = "Key")]
	pub key: String,
	#[serde(rename = "LastModified")]
	pub last_modified: String,
	#[serde(rename = "ETag")]
	pub etag: String,
	#[serde(rename = "Size")]
	pub size: usize,
	#[serde(rename = "StorageClass")]
	pub storage_class: &'static str,
}

/// `Delete` request body for `DeleteObjects`.
#[derive(Debug, Deserialize)]
#[serde(rename = "Delete")]
pub struct DeleteObjects {
	#[serde(rename = "Quiet", default)]
	pub quiet: bool,
	#[serde(rename = "Object", default)]
	pub objects: Vec<ObjectIdentifier>,
}

#[derive(Debug, Deserialize)]
pub struct ObjectIdentifier {
	#[serde(rename = "Key")]
	pub key: String,
}

/// `DeleteResult` response.
#[derive(Debug, Serialize)]
#[serde(rename = "DeleteResult")]
pub struct DeleteObjectsResponse {
	#[serde(rename = "Deleted", default, skip_serializing_if = "Vec::is_empty")]
	pub deleted: Vec<DeletedObject>,
}

#[derive(Debug, Serialize)]
pub struct DeletedObject {
	#[serde(rename = "Key")]
	pub key: String,
}

/// `Error` response body.
#[derive(Debug, Serialize)]
#[serde(rename = "Error")]
pub struct ErrorResponse<'a> {
	#[serde(rename = "Code")]
	pub code: &'a str,
	#[serde(rename = "Message")]
	pub message: &'a str,
	#[serde(rename = "Resource")]
	pub resource: &'a str,
	#[serde(rename = "RequestId")]
	pub request_id: &'a str,
}

/// Serialize `value` as an XML document.
pub fn to_xml<T: Serialize>(value: &T) -> Result<String, String> {
	let mut buffer = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
	quick_xml::se::to_writer(&mut buffer, value).map_err(|e| e.to_string())?;
	Ok(buffer)
}
