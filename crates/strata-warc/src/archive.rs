//! Archive-level reading and writing.
//!
//! An archive is either plain concatenated records or a sequence of gzip
//! members. Records decoded from a gzip member carry the compressed offset of
//! that member, so per-record gzip files yield offsets usable for random access.

use std::io::{Read, Write};

use flate2::Compression;
use flate2::bufread::GzDecoder;
use flate2::write::GzEncoder;

use crate::record::{WarcRecord, parse_record};
use crate::{Result, WarcError};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Compression layout of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
	/// Uncompressed records
	Plain,
	/// One or more gzip members
	Gzip,
}

impl ArchiveFormat {
	/// Detect the format from the leading bytes.
	pub fn detect(data: &[u8]) -> Self {
		if data.starts_with(&GZIP_MAGIC) {
			ArchiveFormat::Gzip
		} else {
			ArchiveFormat::Plain
		}
	}
}

/// Read every record in `data`.
pub fn read_records(data: &[u8]) -> Result<Vec<WarcRecord>> {
	match ArchiveFormat::detect(data) {
		ArchiveFormat::Plain => read_plain(data, 0),
		ArchiveFormat::Gzip => read_gzip_members(data),
	}
}

fn read_plain(data: &[u8], base_offset: u64) -> Result<Vec<WarcRecord>> {
	let mut records = Vec::new();
	let mut pos = 0;
	while pos < data.len() {
		if data[pos..].iter().all(u8::is_ascii_whitespace) {
			break;
		}
		let offset = base_offset + pos as u64;
		let (record, consumed) = parse_record(&data[pos..], offset)?;
		records.push(record);
		pos += consumed;
	}
	Ok(records)
}

fn read_gzip_members(data: &[u8]) -> Result<Vec<WarcRecord>> {
	let mut records = Vec::new();
	let mut pos = 0;
	while pos < data.len() {
		if !data[pos..].starts_with(&GZIP_MAGIC) {
			// Trailing padding after the last member.
			if data[pos..].iter().all(|b| *b == 0) {
				break;
			}
			return Err(WarcError::parse(pos as u64, "expected gzip member"));
		}

		let member_offset = pos as u64;
		let mut decoder = GzDecoder::new(&data[pos..]);
		let mut decompressed = Vec::new();
		decoder
			.read_to_end(&mut decompressed)
			.map_err(|source| WarcError::Gzip {
				offset: member_offset,
				source,
			})?;
		let remaining = decoder.into_inner().len();
		pos = data.len() - remaining;

		tracing::trace!(offset = member_offset, bytes = decompressed.len(), "gzip member");

		let mut member_pos = 0;
		while member_pos < decompressed.len() {
			if decompressed[member_pos..].iter().all(u8::is_ascii_whitespace) {
				break;
			}
			let (mut record, consumed) = parse_record(&decompressed[member_pos..], member_offset)?;
			record.offset = member_offset;
			records.push(record);
			member_pos += consumed;
		}
	}
	Ok(records)
}

/// Write each record as its own gzip member.
pub fn write_gzip_members(records: &[WarcRecord]) -> Result<Vec<u8>> {
	let mut out = Vec::new();
	for record in records {
		let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
		encoder.write_all(&record.to_bytes())?;
		out.extend_from_slice(&encoder.finish()?);
	}
	Ok(out)
}

/// Write records uncompressed.
pub fn write_plain(records: &[WarcRecord]) -> Vec<u8> {
	records.iter().flat_map(|r| r.to_bytes()).collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::{fixture, rstest};

	fn record(kind: &str, block: &str) -> WarcRecord {
		WarcRecord {
			version: "WARC/1.0".to_string(),
			headers: vec![
				("WARC-Type".to_string(), kind.to_string()),
				("Content-Length".to_string(), block.len().to_string()),
			],
			block: block.as_bytes().to_vec(),
			offset: 0,
		}
	}

	#[fixture]
	fn records() -> Vec<WarcRecord> {
		vec![
			record("warcinfo", "software: strata"),
			record("response", "HTTP/1.0 200 OK\r\n\r\nbody"),
			record("metadata", ""),
		]
	}

	#[rstest]
	fn detects_format() {
		assert_eq!(ArchiveFormat::detect(b"WARC/1.0"), ArchiveFormat::Plain);
		assert_eq!(ArchiveFormat::detect(&[0x1f, 0x8b, 8]), ArchiveFormat::Gzip);
	}

	#[rstest]
	fn plain_offsets_are_byte_positions(records: Vec<WarcRecord>) {
		let data = write_plain(&records);
		let parsed = read_records(&data).unwrap();

		assert_eq!(parsed.len(), 3);
		assert_eq!(parsed[0].offset, 0);
		assert_eq!(parsed[1].offset, records[0].to_bytes().len() as u64);
	}

	#[rstest]
	fn gzip_offsets_point_at_members(records: Vec<WarcRecord>) {
		let data = write_gzip_members(&records).unwrap();
		let parsed = read_records(&data).unwrap();

		assert_eq!(parsed.len(), 3);
		assert_eq!(parsed[0].offset, 0);
		for record in &parsed {
			let start = record.offset as usize;
			assert_eq!(&data[start..start + 2], &GZIP_MAGIC);
		}
		assert!(parsed[1].offset < parsed[2].offset);
		assert_eq!(parsed[1].record_type(), "response");
	}

	#[rstest]
	fn single_member_holding_many_records(records: Vec<WarcRecord>) {
		let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
		encoder.write_all(&write_plain(&records)).unwrap();
		let data = encoder.finish().unwrap();

		let parsed = read_records(&data).unwrap();
		assert_eq!(parsed.len(), 3);
		assert!(parsed.iter().all(|r| r.offset == 0));
	}

	#[rstest]
	fn truncated_gzip_is_an_error(records: Vec<WarcRecord>) {
		let data = write_gzip_members(&records).unwrap();
		let truncated = &data[..data.len() - 10];
		assert!(read_records(truncated).is_err());
	}
}
