//! In-memory S3 request handling.
//!
//! Path-style addressing only: `/<bucket>` for bucket operations and
//! `/<bucket>/<key>` for object operations.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http_body_util::{BodyExt, Full};
use http::header::{self, HeaderMap, HeaderName, HeaderValue};
use http::request::Parts;
use http::{Method, Request, Response, StatusCode};
use hyper::body::Incoming;
use md5::{Digest, Md5};
use parking_lot::Mutex;

use super::xml::{
	DeleteObjects, DeleteObjectsResponse, DeletedObject, ErrorResponse, ListObjectsV2Response,
	ObjectEntry, to_xml,
};
use crate::server::Handler;

const MAX_KEYS: usize = 1000;

static REQUEST_ID: HeaderName = HeaderName::from_static("x-amz-request-id");

#[derive(Debug, Clone)]
struct StoredObject {
	data: Bytes,
	etag: String,
	content_type: Option<String>,
	last_modified: DateTime<Utc>,
}

type Bucket = BTreeMap<String, StoredObject>;

/// Buckets and objects held by the emulator.
#[derive(Debug, Default)]
pub struct EmulatorState {
	buckets: Mutex<BTreeMap<String, Bucket>>,
}

impl EmulatorState {
	/// Keys stored in `bucket`, in order. Empty if the bucket does not exist.
	pub fn keys(&self, bucket: &str) -> Vec<String> {
		self.buckets
			.lock()
			.get(bucket)
			.map(|objects| objects.keys().cloned().collect())
			.unwrap_or_default()
	}

	pub fn bucket_exists(&self, bucket: &str) -> bool {
		self.buckets.lock().contains_key(bucket)
	}
}

/// An S3 error response.
#[derive(Debug)]
struct S3Error {
	status: StatusCode,
	code: &'static str,
	message: String,
	resource: String,
}

impl S3Error {
	fn new(status: StatusCode, code: &'static str, message: impl Into<String>, resource: &str) -> Self {
		Self {
			status,
			code,
			message: message.into(),
			resource: resource.to_string(),
		}
	}

	fn no_such_bucket(bucket: &str) -> Self {
		Self::new(
			StatusCode::NOT_FOUND,
			"NoSuchBucket",
			"The specified bucket does not exist",
			bucket,
		)
	}

	fn no_such_key(key: &str) -> Self {
		Self::new(
			StatusCode::NOT_FOUND,
			"NoSuchKey",
			"The specified key does not exist.",
			key,
		)
	}

	fn method_not_allowed(method: &Method, resource: &str) -> Self {
		Self::new(
			StatusCode::METHOD_NOT_ALLOWED,
			"MethodNotAllowed",
			format!("{} is not supported by the emulator for this resource", method),
			resource,
		)
	}

	fn invalid_request(message: impl Into<String>, resource: &str) -> Self {
		Self::new(StatusCode::BAD_REQUEST, "InvalidRequest", message, resource)
	}

	fn into_response(self, request_id: &str) -> Response<Full<Bytes>> {
		let body = to_xml(&ErrorResponse {
			code: self.code,
			message: &self.message,
			resource: &self.resource,
			request_id,
		})
		.unwrap_or_default();
		xml_response(self.status, body, request_id)
	}
}

type S3Result = Result<Response<Full<Bytes>>, S3Error>;

fn xml_response(status: StatusCode, body: String, request_id: &str) -> Response<Full<Bytes>> {
	let mut response = Response::new(Full::new(Bytes::from(body)));
	*response.status_mut() = status;
	let headers = response.headers_mut();
	headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/xml"));
	insert_header(headers, REQUEST_ID.clone(), request_id);
	response
}

fn empty_response(status: StatusCode, request_id: &str) -> Response<Full<Bytes>> {
	let mut response = Response::new(Full::new(Bytes::new()));
	*response.status_mut() = status;
	insert_header(response.headers_mut(), REQUEST_ID.clone(), request_id);
	response
}

fn insert_header(headers: &mut HeaderMap, name: HeaderName, value: &str) {
	if let Ok(value) = HeaderValue::from_str(value) {
		headers.insert(name, value);
	}
}

fn s3_timestamp(dt: &DateTime<Utc>) -> String {
	dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn http_date(dt: &DateTime<Utc>) -> String {
	dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

/// Decode an `aws-chunked` body into the raw payload.
///
/// Each chunk is `<hex-size>[;ext]\r\n<data>\r\n`; a zero-size chunk ends the
/// payload and any trailing checksum headers are ignored.
pub(crate) fn decode_aws_chunked(body: &[u8]) -> Option<Vec<u8>> {
	let mut out = Vec::with_capacity(body.len());
	let mut pos = 0;
	loop {
		let line_end = body[pos..].windows(2).position(|w| w == b"\r\n")? + pos;
		let line = std::str::from_utf8(&body[pos..line_end]).ok()?;
		let size_hex = line.split(';').next()?.trim();
		let size = usize::from_str_radix(size_hex, 16).ok()?;
		pos = line_end + 2;
		if size == 0 {
			return Some(out);
		}
		let end = pos.checked_add(size).filter(|end| *end <= body.len())?;
		out.extend_from_slice(&body[pos..end]);
		pos = end;
		if body[pos..].starts_with(b"\r\n") {
			pos += 2;
		}
	}
}

fn is_aws_chunked(headers: &HeaderMap) -> bool {
	let streaming = headers
		.get("x-amz-content-sha256")
		.and_then(|v| v.to_str().ok())
		.is_some_and(|v| v.starts_with("STREAMING-"));
	let encoded = headers
		.get(header::CONTENT_ENCODING)
		.and_then(|v| v.to_str().ok())
		.is_some_and(|v| v.split(',').any(|e| e.trim() == "aws-chunked"));
	streaming || encoded
}

/// Hyper handler backed by an [`EmulatorState`].
#[derive(Debug, Clone)]
pub struct S3Service {
	state: Arc<EmulatorState>,
}

impl S3Service {
	pub fn new(state: Arc<EmulatorState>) -> Self {
		Self { state }
	}

	fn route(&self, parts: &Parts, body: Bytes) -> S3Result {
		let path = parts.uri.path().trim_start_matches('/');
		let query: HashMap<String, String> =
			url::form_urlencoded::parse(parts.uri.query().unwrap_or_default().as_bytes())
				.into_owned()
				.collect();

		let (bucket, raw_key) = path.split_once('/').unwrap_or((path, ""));
		if bucket.is_empty() {
			return Err(S3Error::method_not_allowed(&parts.method, "/"));
		}
		let key = urlencoding::decode(raw_key)
			.map_err(|e| S3Error::invalid_request(format!("invalid key encoding: {}", e), raw_key))?
			.into_owned();

		if key.is_empty() {
			match parts.method {
				Method::PUT => self.create_bucket(bucket),
				Method::HEAD => self.head_bucket(bucket),
				Method::GET => self.list_objects_v2(bucket, &query),
				Method::POST if query.contains_key("delete") => self.delete_objects(bucket, &body),
				ref method => Err(S3Error::method_not_allowed(method, bucket)),
			}
		} else {
			match parts.method {
				Method::PUT if parts.headers.contains_key("x-amz-copy-source") => Err(
					S3Error::invalid_request("CopyObject is not supported by the emulator", &key),
				),
				Method::PUT => self.put_object(bucket, &key, &parts.headers, body),
				Method::GET => self.get_object(bucket, &key, false),
				Method::HEAD => self.get_object(bucket, &key, true),
				Method::DELETE => self.delete_object(bucket, &key),
				ref method => Err(S3Error::method_not_allowed(method, &key)),
			}
		}
	}

	fn create_bucket(&self, bucket: &str) -> S3Result {
		let mut buckets = self.state.buckets.lock();
		if buckets.contains_key(bucket) {
			return Err(S3Error::new(
				StatusCode::CONFLICT,
				"BucketAlreadyOwnedByYou",
				"Your previous request to create the named bucket succeeded and you already own it.",
				bucket,
			));
		}
		buckets.insert(bucket.to_string(), Bucket::new());
		tracing::debug!(%bucket, "emulator created bucket");

		let mut response = Response::new(Full::new(Bytes::new()));
		insert_header(response.headers_mut(), header::LOCATION, &format!("/{}", bucket));
		Ok(response)
	}

	fn head_bucket(&self, bucket: &str) -> S3Result {
		if self.state.bucket_exists(bucket) {
			Ok(Response::new(Full::new(Bytes::new())))
		} else {
			Err(S3Error::no_such_bucket(bucket))
		}
	}

	fn list_objects_v2(&self, bucket: &str, query: &HashMap<String, String>) -> S3Result {
		let buckets = self.state.buckets.lock();
		let objects = buckets
			.get(bucket)
			.ok_or_else(|| S3Error::no_such_bucket(bucket))?;

		let prefix = query.get("prefix").cloned().unwrap_or_default();
		let max_keys = match query.get("max-keys") {
			Some(value) => value
				.parse::<usize>()
				.map_err(|_| S3Error::invalid_request("max-keys must be an integer", bucket))?
				.min(MAX_KEYS),
			None => MAX_KEYS,
		};
		let continuation_token = query.get("continuation-token").cloned();
		let start_after = query.get("start-after").cloned();
		let url_encoded = query.get("encoding-type").is_some_and(|e| e == "url");

		// The continuation token is the last key of the previous page.
		let after = match (&continuation_token, &start_after) {
			(Some(token), _) => Some(token.as_str()),
			(None, Some(start)) => Some(start.as_str()),
			(None, None) => None,
		};

		let mut matching = objects
			.iter()
			.filter(|(key, _)| key.starts_with(&prefix))
			.filter(|(key, _)| after.is_none_or(|after| key.as_str() > after));

		let page: Vec<(&String, &StoredObject)> = matching.by_ref().take(max_keys).collect();
		// An empty page has no key to continue from.
		let is_truncated = !page.is_empty() && matching.next().is_some();
		let next_continuation_token = if is_truncated {
			page.last().map(|(key, _)| key.to_string())
		} else {
			None
		};

		let encode = |value: &str| {
			if url_encoded {
				urlencoding::encode(value).into_owned()
			} else {
				value.to_string()
			}
		};

		let contents: Vec<ObjectEntry> = page
			.iter()
			.map(|(key, object)| ObjectEntry {
				key: encode(key),
				last_modified: s3_timestamp(&object.last_modified),
				etag: object.etag.clone(),
				size: object.data.len(),
				storage_class: "STANDARD",
			})
			.collect();

		let response = ListObjectsV2Response {
			name: bucket.to_string(),
			prefix: encode(&prefix),
			max_keys,
			encoding_type: url_encoded.then(|| "url".to_string()),
			is_truncated,
			continuation_token,
			next_continuation_token,
			start_after: start_after.as_deref().map(encode),
			key_count: contents.len(),
			contents,
		};
		let body = to_xml(&response)
			.map_err(|e| S3Error::new(StatusCode::INTERNAL_SERVER_ERROR, "InternalError", e, bucket))?;

		tracing::trace!(%bucket, %prefix, keys = response.key_count, "emulator listed objects");
		Ok(xml_response(StatusCode::OK, body, ""))
	}

	fn delete_objects(&self, bucket: &str, body: &[u8]) -> S3Result {
		let text = std::str::from_utf8(body)
			.map_err(|_| S3Error::new(StatusCode::BAD_REQUEST, "MalformedXML", "body is not UTF-8", bucket))?;
		let request: DeleteObjects = quick_xml::de::from_str(text).map_err(|e| {
			S3Error::new(StatusCode::BAD_REQUEST, "MalformedXML", e.to_string(), bucket)
		})?;
		if request.objects.len() > MAX_KEYS {
			return Err(S3Error::new(
				StatusCode::BAD_REQUEST,
				"MalformedXML",
				"too many objects in a single DeleteObjects request",
				bucket,
			));
		}

		let mut buckets = self.state.buckets.lock();
		let objects = buckets
			.get_mut(bucket)
			.ok_or_else(|| S3Error::no_such_bucket(bucket))?;

		let mut deleted = Vec::new();
		for object in request.objects {
			objects.remove(&object.key);
			if !request.quiet {
				deleted.push(DeletedObject { key: object.key });
			}
		}
		tracing::trace!(%bucket, "emulator deleted objects");

		let body = to_xml(&DeleteObjectsResponse { deleted })
			.map_err(|e| S3Error::new(StatusCode::INTERNAL_SERVER_ERROR, "InternalError", e, bucket))?;
		Ok(xml_response(StatusCode::OK, body, ""))
	}

	fn put_object(&self, bucket: &str, key: &str, headers: &HeaderMap, body: Bytes) -> S3Result {
		let data = if is_aws_chunked(headers) {
			Bytes::from(decode_aws_chunked(&body).ok_or_else(|| {
				S3Error::invalid_request("malformed aws-chunked body", key)
			})?)
		} else {
			body
		};

		let etag = format!("\"{}\"", hex::encode(Md5::digest(&data)));
		let object = StoredObject {
			data,
			etag: etag.clone(),
			content_type: headers
				.get(header::CONTENT_TYPE)
				.and_then(|v| v.to_str().ok())
				.map(str::to_string),
			last_modified: Utc::now(),
		};

		let mut buckets = self.state.buckets.lock();
		let objects = buckets
			.get_mut(bucket)
			.ok_or_else(|| S3Error::no_such_bucket(bucket))?;
		tracing::trace!(%bucket, %key, bytes = object.data.len(), "emulator stored object");
		objects.insert(key.to_string(), object);

		let mut response = Response::new(Full::new(Bytes::new()));
		insert_header(response.headers_mut(), header::ETAG, &etag);
		Ok(response)
	}

	fn get_object(&self, bucket: &str, key: &str, head: bool) -> S3Result {
		let buckets = self.state.buckets.lock();
		let object = buckets
			.get(bucket)
			.ok_or_else(|| S3Error::no_such_bucket(bucket))?
			.get(key)
			.ok_or_else(|| S3Error::no_such_key(key))?
			.clone();
		drop(buckets);

		let body = if head { Bytes::new() } else { object.data.clone() };
		let mut response = Response::new(Full::new(body));
		let headers = response.headers_mut();
		insert_header(headers, header::CONTENT_LENGTH, &object.data.len().to_string());
		insert_header(headers, header::ETAG, &object.etag);
		insert_header(headers, header::LAST_MODIFIED, &http_date(&object.last_modified));
		insert_header(
			headers,
			header::CONTENT_TYPE,
			object
				.content_type
				.as_deref()
				.unwrap_or("application/octet-stream"),
		);
		Ok(response)
	}

	fn delete_object(&self, bucket: &str, key: &str) -> S3Result {
		let mut buckets = self.state.buckets.lock();
		let objects = buckets
			.get_mut(bucket)
			.ok_or_else(|| S3Error::no_such_bucket(bucket))?;
		objects.remove(key);
		let mut response = Response::new(Full::new(Bytes::new()));
		*response.status_mut() = StatusCode::NO_CONTENT;
		Ok(response)
	}
}

#[async_trait]
impl Handler for S3Service {
	async fn handle(&self, request: Request<Incoming>) -> Response<Full<Bytes>> {
		let request_id = uuid::Uuid::new_v4().simple().to_string();
		let (parts, body) = request.into_parts();
		tracing::trace!(method = %parts.method, uri = %parts.uri, "emulator request");

		let body = match body.collect().await {
			Ok(collected) => collected.to_bytes(),
			Err(e) => {
				return S3Error::invalid_request(format!("failed to read body: {}", e), parts.uri.path())
					.into_response(&request_id);
			}
		};

		match self.route(&parts, body) {
			Ok(mut response) => {
				insert_header(response.headers_mut(), REQUEST_ID.clone(), &request_id);
				response
			}
			Err(err) => {
				tracing::debug!(code = err.code, resource = %err.resource, "emulator error response");
				if parts.method == Method::HEAD {
					empty_response(err.status, &request_id)
				} else {
					err.into_response(&request_id)
				}
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn decodes_signed_chunks() {
		let body = b"5;chunk-signature=abc\r\nhello\r\n6;chunk-signature=def\r\n world\r\n0;chunk-signature=0\r\n\r\n";
		assert_eq!(decode_aws_chunked(body).unwrap(), b"hello world");
	}

	#[rstest]
	fn decodes_unsigned_chunks_with_trailer() {
		let body = b"3\r\nfoo\r\n0\r\nx-amz-checksum-crc32:AAAAAA==\r\n\r\n";
		assert_eq!(decode_aws_chunked(body).unwrap(), b"foo");
	}

	#[rstest]
	#[case(b"zz\r\nfoo\r\n".as_slice())]
	#[case(b"10\r\nfoo\r\n".as_slice())]
	#[case(b"3\r\nfoo".as_slice())]
	fn rejects_malformed_chunks(#[case] body: &[u8]) {
		assert!(decode_aws_chunked(body).is_none());
	}

	#[rstest]
	fn detects_chunked_uploads() {
		let mut headers = HeaderMap::new();
		assert!(!is_aws_chunked(&headers));

		headers.insert(
			"x-amz-content-sha256",
			HeaderValue::from_static("STREAMING-UNSIGNED-PAYLOAD-TRAILER"),
		);
		assert!(is_aws_chunked(&headers));

		let mut headers = HeaderMap::new();
		headers.insert(header::CONTENT_ENCODING, HeaderValue::from_static("aws-chunked"));
		assert!(is_aws_chunked(&headers));
	}

	fn service_with_keys(keys: &[&str]) -> S3Service {
		let service = S3Service::new(Arc::new(EmulatorState::default()));
		service.create_bucket("bucket").unwrap();
		for key in keys {
			service
				.put_object("bucket", key, &HeaderMap::new(), Bytes::from_static(b"x"))
				.unwrap();
		}
		service
	}

	async fn list(service: &S3Service, query: &[(&str, &str)]) -> String {
		let query: HashMap<String, String> = query
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect();
		let response = service.list_objects_v2("bucket", &query).unwrap();
		let body = response.into_body().collect().await.unwrap().to_bytes();
		String::from_utf8(body.to_vec()).unwrap()
	}

	#[rstest]
	#[tokio::test]
	async fn zero_max_keys_is_not_truncated() {
		let service = service_with_keys(&["a/1", "a/2"]);

		let xml = list(&service, &[("max-keys", "0")]).await;
		assert!(xml.contains("<IsTruncated>false</IsTruncated>"), "{}", xml);
		assert!(xml.contains("<KeyCount>0</KeyCount>"), "{}", xml);
		assert!(!xml.contains("NextContinuationToken"), "{}", xml);
	}

	#[rstest]
	#[tokio::test]
	async fn truncated_pages_carry_a_continuation_token() {
		let service = service_with_keys(&["a/1", "a/2", "a/3"]);

		let first = list(&service, &[("prefix", "a/"), ("max-keys", "2")]).await;
		assert!(first.contains("<IsTruncated>true</IsTruncated>"), "{}", first);
		assert!(
			first.contains("<NextContinuationToken>a/2</NextContinuationToken>"),
			"{}",
			first
		);

		let second = list(
			&service,
			&[("prefix", "a/"), ("max-keys", "2"), ("continuation-token", "a/2")],
		)
		.await;
		assert!(second.contains("<Key>a/3</Key>"), "{}", second);
		assert!(second.contains("<IsTruncated>false</IsTruncated>"), "{}", second);
	}
}
