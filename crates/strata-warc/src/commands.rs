//! Implementation of the `check`, `extract` and `recompress` commands.
//!
//! Every command reads and writes through [`strata_storages::open`], so the
//! same invocation works for local paths, HTTP(S) URLs and `s3://` locations.

use std::io::Write;

use serde::Serialize;
use strata_storages::open;

use crate::archive::{read_records, write_gzip_members};
use crate::record::{DigestStatus, WarcRecord};
use crate::{Result, WarcError};

/// Summary line success marker.
pub const NO_ERRORS: &str = "No Errors Found!";

/// `check`: validate every record of every archive.
///
/// Returns the exit code: 0 if all records are valid, 1 otherwise.
pub async fn check<W: Write>(paths: &[String], verbose: bool, out: &mut W) -> Result<i32> {
	let mut invalid = 0usize;

	for path in paths {
		let data = open::read(path).await?;
		let records = match read_records(&data) {
			Ok(records) => records,
			Err(err) => {
				writeln!(out, "{}", path)?;
				writeln!(out, "  Invalid: {}", err)?;
				invalid += 1;
				continue;
			}
		};

		if verbose {
			writeln!(out, "{}", path)?;
		}
		let mut printed_path = verbose;
		for record in &records {
			let status = record.verify_block_digest();
			if verbose {
				writeln!(
					out,
					"  offset {} WARC-Record-ID {} {}",
					record.offset,
					record.record_id(),
					record.record_type()
				)?;
				writeln!(out, "    {}", status)?;
			} else if status.is_failure() {
				if !printed_path {
					writeln!(out, "{}", path)?;
					printed_path = true;
				}
				writeln!(out, "  offset {} {}", record.offset, status)?;
			}
			if status.is_failure() {
				invalid += 1;
			}
		}
		tracing::debug!(%path, records = records.len(), "checked archive");
	}

	if invalid == 0 {
		writeln!(out, "{}", NO_ERRORS)?;
		Ok(0)
	} else {
		writeln!(out, "Found {} Invalid Records", invalid)?;
		Ok(1)
	}
}

/// What `extract` prints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractPart {
	/// Headers and block
	#[default]
	Record,
	/// WARC headers only
	Headers,
	/// Payload only
	Payload,
}

/// `extract`: print the record at `index`.
pub async fn extract<W: Write>(path: &str, index: usize, part: ExtractPart, out: &mut W) -> Result<i32> {
	let data = open::read(path).await?;
	let mut records = read_records(&data)?;
	let count = records.len();
	if index >= count {
		return Err(WarcError::RecordIndex { index, count });
	}
	let record = records.swap_remove(index);

	match part {
		ExtractPart::Record => {
			out.write_all(&record.header_bytes())?;
			out.write_all(&record.block)?;
		}
		ExtractPart::Headers => out.write_all(&record.header_bytes())?,
		ExtractPart::Payload => out.write_all(record.payload())?,
	}
	out.flush()?;
	Ok(0)
}

#[derive(Serialize)]
struct RecordSummary<'a> {
	offset: String,
	#[serde(rename = "warc-type")]
	warc_type: &'a str,
	#[serde(rename = "warc-target-uri", skip_serializing_if = "Option::is_none")]
	warc_target_uri: Option<&'a str>,
}

/// JSON formatter emitting `{"key": "value", ...}` on one line.
struct SpacedFormatter;

impl serde_json::ser::Formatter for SpacedFormatter {
	fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> std::io::Result<()>
	where
		W: ?Sized + std::io::Write,
	{
		if first { Ok(()) } else { writer.write_all(b", ") }
	}

	fn begin_object_value<W>(&mut self, writer: &mut W) -> std::io::Result<()>
	where
		W: ?Sized + std::io::Write,
	{
		writer.write_all(b": ")
	}
}

fn summary_line(record: &WarcRecord) -> Result<String> {
	let summary = RecordSummary {
		offset: record.offset.to_string(),
		warc_type: record.record_type(),
		warc_target_uri: record.target_uri(),
	};
	let mut buf = Vec::new();
	let mut serializer = serde_json::Serializer::with_formatter(&mut buf, SpacedFormatter);
	summary.serialize(&mut serializer)?;
	Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// `recompress`: rewrite `src` to `dst` with one gzip member per record.
///
/// The written archive is read back and validated before reporting.
pub async fn recompress<W: Write>(src: &str, dst: &str, verbose: bool, out: &mut W) -> Result<i32> {
	let data = open::read(src).await?;
	let records = read_records(&data)?;
	let compressed = write_gzip_members(&records)?;
	open::write(dst, &compressed).await?;
	tracing::debug!(%src, %dst, records = records.len(), "recompressed archive");

	let written = open::read(dst).await?;
	let reread = read_records(&written)?;

	let mut invalid = 0usize;
	for record in &reread {
		let status = record.verify_block_digest();
		if verbose {
			writeln!(out, "{}", summary_line(record)?)?;
		}
		if let DigestStatus::Failed { .. } = status {
			writeln!(out, "  offset {} {}", record.offset, status)?;
			invalid += 1;
		}
	}

	if reread.len() != records.len() {
		writeln!(
			out,
			"Invalid: wrote {} records, read back {}",
			records.len(),
			reread.len()
		)?;
		invalid += 1;
	}

	if invalid == 0 {
		writeln!(out, "{}", NO_ERRORS)?;
	} else {
		writeln!(out, "Found {} Invalid Records", invalid)?;
	}
	writeln!(out, "{} records read", reread.len())?;
	Ok(if invalid == 0 { 0 } else { 1 })
}
