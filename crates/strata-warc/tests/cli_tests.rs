//! End-to-end tests of the command-line entry point on local files.

use rstest::{fixture, rstest};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use strata_warc::archive::{write_gzip_members, write_plain};
use strata_warc::{WarcRecord, read_records, run};
use tempfile::TempDir;

fn record(kind: &str, target: Option<&str>, block: &[u8], digest: bool) -> WarcRecord {
	let mut headers = vec![
		("WARC-Type".to_string(), kind.to_string()),
		(
			"WARC-Record-ID".to_string(),
			format!("<urn:uuid:{}>", kind),
		),
	];
	if let Some(target) = target {
		headers.push(("WARC-Target-URI".to_string(), target.to_string()));
	}
	if digest {
		headers.push((
			"WARC-Block-Digest".to_string(),
			format!("sha256:{}", hex::encode(Sha256::digest(block))),
		));
	}
	headers.push(("Content-Length".to_string(), block.len().to_string()));

	WarcRecord {
		version: "WARC/1.0".to_string(),
		headers,
		block: block.to_vec(),
		offset: 0,
	}
}

struct Archive {
	dir: TempDir,
	records: Vec<WarcRecord>,
}

impl Archive {
	fn path(&self, name: &str) -> String {
		self.dir.path().join(name).to_string_lossy().into_owned()
	}
}

#[fixture]
fn archive() -> Archive {
	let dir = TempDir::new().unwrap();
	let records = vec![
		record("warcinfo", None, b"software: strata-warc\r\n", true),
		record(
			"response",
			Some("http://example.com/"),
			b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\nhello",
			true,
		),
		record("request", Some("http://example.com/"), b"GET / HTTP/1.0\r\n\r\n", false),
	];
	std::fs::write(dir.path().join("plain.warc"), write_plain(&records)).unwrap();
	std::fs::write(
		dir.path().join("members.warc.gz"),
		write_gzip_members(&records).unwrap(),
	)
	.unwrap();
	Archive { dir, records }
}

async fn run_captured(args: &[&str]) -> (i32, String) {
	let mut out = Vec::new();
	let code = run(args.iter().copied(), &mut out).await;
	(code, String::from_utf8(out).unwrap())
}

#[rstest]
#[tokio::test]
async fn check_verbose_lists_every_record(archive: Archive) {
	let path = archive.path("members.warc.gz");
	let (code, out) = run_captured(&["check", "-v", &path]).await;

	assert_eq!(code, 0, "{}", out);
	assert!(out.contains("WARC-Record-ID <urn:uuid:warcinfo> warcinfo"));
	assert_eq!(out.matches("digest pass").count(), 2);
	assert!(out.contains("no digest to check"));
	assert!(out.contains("No Errors Found!"));
	assert!(!out.contains("Invalid"));
}

#[rstest]
#[tokio::test]
async fn check_reports_digest_mismatch(archive: Archive) {
	let mut records = archive.records.clone();
	records[1].block = b"HTTP/1.0 200 OK\r\nContent-Type: text/plain\r\n\r\nHELLO".to_vec();
	let path = archive.path("tampered.warc");
	std::fs::write(&path, write_plain(&records)).unwrap();

	let (code, out) = run_captured(&["check", &path]).await;

	assert_eq!(code, 1);
	assert!(out.contains("Invalid: block digest"));
	assert!(out.contains("Found 1 Invalid Records"));
}

#[rstest]
#[tokio::test]
async fn extract_prints_headers_and_payload(archive: Archive) {
	let path = archive.path("plain.warc");

	let (code, out) = run_captured(&["extract", &path, "1"]).await;
	assert_eq!(code, 0);
	assert!(out.starts_with("WARC/1.0\r\nWARC-Type: response\r\n"));
	assert!(out.ends_with("hello"));

	let (_, headers) = run_captured(&["extract", "--headers", &path, "1"]).await;
	assert!(headers.contains("WARC-Target-URI: http://example.com/\r\n"));
	assert!(!headers.contains("hello"));

	let (_, payload) = run_captured(&["extract", "--payload", &path, "1"]).await;
	assert_eq!(payload, "hello");
}

#[rstest]
#[tokio::test]
async fn extract_out_of_range_fails(archive: Archive) {
	let path = archive.path("plain.warc");
	let (code, _) = run_captured(&["extract", &path, "3"]).await;
	assert_eq!(code, 1);
}

#[rstest]
#[tokio::test]
async fn recompress_plain_to_members(archive: Archive) {
	let src = archive.path("plain.warc");
	let dst = archive.path("out/recompressed.warc.gz");

	let (code, out) = run_captured(&["recompress", "-v", &src, &dst]).await;

	assert_eq!(code, 0, "{}", out);
	assert!(out.contains(r#"{"offset": "0", "warc-type": "warcinfo"}"#));
	assert!(out.contains(r#""warc-target-uri": "http://example.com/""#));
	assert!(out.contains("No Errors Found!"));
	assert!(out.contains("3 records read"));

	let written = std::fs::read(PathBuf::from(&dst)).unwrap();
	let records = read_records(&written).unwrap();
	assert_eq!(records.len(), 3);
	assert!(records[1].offset > 0);
}

#[rstest]
#[tokio::test]
async fn missing_file_is_an_error() {
	let (code, _) = run_captured(&["check", "/definitely/not/here.warc"]).await;
	assert_eq!(code, 1);
}
