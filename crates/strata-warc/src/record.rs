//! WARC record model and parser.

use sha2::{Digest, Sha256};

use crate::{Result, WarcError};

const CRLF: &[u8] = b"\r\n";

/// A single WARC record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarcRecord {
	/// Version line without line ending, e.g. `WARC/1.0`
	pub version: String,
	/// Headers in file order
	pub headers: Vec<(String, String)>,
	/// Content block, exactly `Content-Length` bytes
	pub block: Vec<u8>,
	/// Offset of the record (or of its gzip member) in the archive
	pub offset: u64,
}

/// Result of verifying `WARC-Block-Digest`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigestStatus {
	/// Digest present and matching
	Passed,
	/// Digest present and not matching
	Failed { expected: String, actual: String },
	/// Record carries no block digest
	Absent,
	/// Digest uses an algorithm this crate does not verify
	Unsupported(String),
}

impl DigestStatus {
	/// Whether this status makes the record invalid.
	pub fn is_failure(&self) -> bool {
		matches!(self, DigestStatus::Failed { .. })
	}
}

impl std::fmt::Display for DigestStatus {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			DigestStatus::Passed => write!(f, "digest pass"),
			DigestStatus::Failed { expected, actual } => {
				write!(f, "Invalid: block digest {} != sha256:{}", expected, actual)
			}
			DigestStatus::Absent => write!(f, "no digest to check"),
			DigestStatus::Unsupported(alg) => write!(f, "digest not checked ({})", alg),
		}
	}
}

impl WarcRecord {
	/// Header value by case-insensitive name.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers
			.iter()
			.find(|(k, _)| k.eq_ignore_ascii_case(name))
			.map(|(_, v)| v.as_str())
	}

	/// `WARC-Type`, or the empty string if missing.
	pub fn record_type(&self) -> &str {
		self.header("WARC-Type").unwrap_or_default()
	}

	/// `WARC-Record-ID`, or the empty string if missing.
	pub fn record_id(&self) -> &str {
		self.header("WARC-Record-ID").unwrap_or_default()
	}

	/// `WARC-Target-URI` if present.
	pub fn target_uri(&self) -> Option<&str> {
		self.header("WARC-Target-URI")
	}

	/// The payload: for `application/http` blocks the part after the HTTP
	/// headers, otherwise the whole block.
	pub fn payload(&self) -> &[u8] {
		let is_http = self
			.header("Content-Type")
			.is_some_and(|ct| ct.starts_with("application/http"));
		if !is_http {
			return &self.block;
		}
		match find(&self.block, b"\r\n\r\n") {
			Some(pos) => &self.block[pos + 4..],
			None => &[],
		}
	}

	/// Serialize the version line and headers, including the blank line.
	pub fn header_bytes(&self) -> Vec<u8> {
		let mut out = Vec::new();
		out.extend_from_slice(self.version.as_bytes());
		out.extend_from_slice(CRLF);
		for (name, value) in &self.headers {
			out.extend_from_slice(name.as_bytes());
			out.extend_from_slice(b": ");
			out.extend_from_slice(value.as_bytes());
			out.extend_from_slice(CRLF);
		}
		out.extend_from_slice(CRLF);
		out
	}

	/// Serialize the full record, including the trailing `CRLF CRLF`.
	pub fn to_bytes(&self) -> Vec<u8> {
		let mut out = self.header_bytes();
		out.extend_from_slice(&self.block);
		out.extend_from_slice(b"\r\n\r\n");
		out
	}

	/// Check `WARC-Block-Digest` against the block.
	///
	/// Only `sha256:<hex>` digests are verified.
	pub fn verify_block_digest(&self) -> DigestStatus {
		let Some(digest) = self.header("WARC-Block-Digest") else {
			return DigestStatus::Absent;
		};
		let (algorithm, expected) = digest.split_once(':').unwrap_or(("", digest));
		if !algorithm.eq_ignore_ascii_case("sha256") {
			return DigestStatus::Unsupported(algorithm.to_string());
		}

		let actual = hex::encode(Sha256::digest(&self.block));
		if actual.eq_ignore_ascii_case(expected) {
			DigestStatus::Passed
		} else {
			DigestStatus::Failed {
				expected: digest.to_string(),
				actual,
			}
		}
	}
}

/// Parse one record from the start of `data`.
///
/// Returns the record and the number of bytes consumed, including the
/// record trailer. `offset` is stored on the record and used in errors.
pub fn parse_record(data: &[u8], offset: u64) -> Result<(WarcRecord, usize)> {
	let mut pos = 0;

	let version = next_line(data, &mut pos)
		.ok_or_else(|| WarcError::parse(offset, "missing version line"))?;
	let version = String::from_utf8_lossy(version).into_owned();
	if !version.starts_with("WARC/") {
		return Err(WarcError::parse(
			offset,
			format!("expected WARC version line, got {:?}", truncate(&version)),
		));
	}

	let mut headers: Vec<(String, String)> = Vec::new();
	loop {
		let line = next_line(data, &mut pos)
			.ok_or_else(|| WarcError::parse(offset, "unterminated header block"))?;
		if line.is_empty() {
			break;
		}
		let line = String::from_utf8_lossy(line);

		// Folded continuation line.
		if line.starts_with([' ', '\t']) {
			match headers.last_mut() {
				Some((_, value)) => {
					value.push(' ');
					value.push_str(line.trim());
					continue;
				}
				None => return Err(WarcError::parse(offset, "continuation before first header")),
			}
		}

		let (name, value) = line
			.split_once(':')
			.ok_or_else(|| WarcError::parse(offset, format!("malformed header {:?}", truncate(&line))))?;
		headers.push((name.trim().to_string(), value.trim().to_string()));
	}

	let length = headers
		.iter()
		.find(|(k, _)| k.eq_ignore_ascii_case("Content-Length"))
		.ok_or_else(|| WarcError::parse(offset, "missing Content-Length"))?
		.1
		.parse::<usize>()
		.map_err(|e| WarcError::parse(offset, format!("bad Content-Length: {}", e)))?;

	let end = pos
		.checked_add(length)
		.filter(|end| *end <= data.len())
		.ok_or_else(|| WarcError::parse(offset, "block shorter than Content-Length"))?;
	let block = data[pos..end].to_vec();
	pos = end;

	// Trailer is two line breaks; tolerate bare LF.
	for _ in 0..2 {
		if data[pos..].starts_with(CRLF) {
			pos += 2;
		} else if data[pos..].starts_with(b"\n") {
			pos += 1;
		}
	}

	Ok((
		WarcRecord {
			version,
			headers,
			block,
			offset,
		},
		pos,
	))
}

fn next_line<'a>(data: &'a [u8], pos: &mut usize) -> Option<&'a [u8]> {
	let rest = data.get(*pos..)?;
	let newline = rest.iter().position(|b| *b == b'\n')?;
	*pos += newline + 1;
	let line = &rest[..newline];
	Some(line.strip_suffix(b"\r").unwrap_or(line))
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
	haystack.windows(needle.len()).position(|w| w == needle)
}

fn truncate(s: &str) -> &str {
	match s.char_indices().nth(40) {
		Some((idx, _)) => &s[..idx],
		None => s,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	const RESPONSE: &[u8] = b"WARC/1.0\r\n\
WARC-Type: response\r\n\
WARC-Record-ID: <urn:uuid:0001>\r\n\
WARC-Target-URI: http://example.com/\r\n\
Content-Type: application/http; msgtype=response\r\n\
Content-Length: 46\r\n\
\r\n\
HTTP/1.0 200 OK\r\nContent-Type: text/html\r\n\r\nhi\r\n\r\n";

	#[rstest]
	fn parses_headers_and_block() {
		let (record, consumed) = parse_record(RESPONSE, 0).unwrap();

		assert_eq!(consumed, RESPONSE.len());
		assert_eq!(record.version, "WARC/1.0");
		assert_eq!(record.record_type(), "response");
		assert_eq!(record.header("warc-target-uri"), Some("http://example.com/"));
		assert_eq!(record.block.len(), 46);
		assert_eq!(record.payload(), b"hi");
	}

	#[rstest]
	fn serialization_matches_input() {
		let (record, _) = parse_record(RESPONSE, 0).unwrap();
		assert_eq!(record.to_bytes(), RESPONSE);
	}

	#[rstest]
	#[case(b"HTTP/1.1 200 OK\r\n\r\n".as_slice(), "expected WARC version line")]
	#[case(b"WARC/1.0\r\nWARC-Type: x\r\n\r\n".as_slice(), "missing Content-Length")]
	#[case(b"WARC/1.0\r\nContent-Length: 10\r\n\r\nabc".as_slice(), "block shorter")]
	#[case(b"WARC/1.0\r\nWARC-Type: x\r\n".as_slice(), "unterminated header block")]
	fn rejects_malformed_records(#[case] input: &[u8], #[case] message: &str) {
		let err = parse_record(input, 7).unwrap_err();
		let text = err.to_string();
		assert!(text.contains("offset 7"), "{}", text);
		assert!(text.contains(message), "{}", text);
	}

	#[rstest]
	fn folds_continuation_lines() {
		let input = b"WARC/1.0\r\nWARC-Warcinfo: first\r\n  second\r\nContent-Length: 0\r\n\r\n\r\n\r\n";
		let (record, _) = parse_record(input, 0).unwrap();
		assert_eq!(record.header("WARC-Warcinfo"), Some("first second"));
	}

	#[rstest]
	fn verifies_sha256_block_digest() {
		let mut record = WarcRecord {
			version: "WARC/1.0".to_string(),
			headers: vec![],
			block: b"abc".to_vec(),
			offset: 0,
		};
		assert_eq!(record.verify_block_digest(), DigestStatus::Absent);

		record.headers.push((
			"WARC-Block-Digest".to_string(),
			"sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad".to_string(),
		));
		assert_eq!(record.verify_block_digest(), DigestStatus::Passed);

		record.block = b"abd".to_vec();
		assert!(record.verify_block_digest().is_failure());

		record.headers[0].1 = "sha1:ABCDEF".to_string();
		assert_eq!(
			record.verify_block_digest(),
			DigestStatus::Unsupported("sha1".to_string())
		);
	}
}
