//! Command-line parsing and dispatch.

use std::ffi::OsString;
use std::io::Write;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};

use crate::commands::{self, ExtractPart};

#[derive(Parser, Debug)]
#[command(name = "strata-warc")]
#[command(about = "Check, extract and recompress WARC archives", long_about = None)]
#[command(version)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Validate archives and their block digests
	Check {
		/// Print every record, not only failures
		#[arg(short, long)]
		verbose: bool,

		/// Archive locations (paths, http(s):// or s3:// URLs)
		#[arg(value_name = "PATH", required = true)]
		paths: Vec<String>,
	},

	/// Print a single record
	Extract {
		/// Print only the WARC headers
		#[arg(long, conflicts_with = "payload")]
		headers: bool,

		/// Print only the payload
		#[arg(long)]
		payload: bool,

		/// Archive location
		#[arg(value_name = "PATH")]
		path: String,

		/// Zero-based record index
		#[arg(value_name = "INDEX")]
		index: usize,
	},

	/// Rewrite an archive with one gzip member per record
	Recompress {
		/// Print a JSON summary per record
		#[arg(short, long)]
		verbose: bool,

		/// Source archive location
		#[arg(value_name = "SRC")]
		src: String,

		/// Destination archive location
		#[arg(value_name = "DST")]
		dst: String,
	},
}

/// Run the CLI with `args` (without the program name), writing to `out`.
///
/// Returns the process exit code. Parse errors exit with 2, command errors
/// with 1; both are reported on standard error.
pub async fn run<I, T, W>(args: I, out: &mut W) -> i32
where
	I: IntoIterator<Item = T>,
	T: Into<OsString> + Clone,
	W: Write,
{
	let argv = std::iter::once(OsString::from("strata-warc")).chain(args.into_iter().map(Into::into));
	let cli = match Cli::try_parse_from(argv) {
		Ok(cli) => cli,
		Err(err) => {
			return match err.kind() {
				ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
					let _ = write!(out, "{}", err);
					0
				}
				_ => {
					eprintln!("{}", err);
					2
				}
			};
		}
	};

	let result = match cli.command {
		Commands::Check { verbose, paths } => commands::check(&paths, verbose, out).await,
		Commands::Extract {
			headers,
			payload,
			path,
			index,
		} => {
			let part = if headers {
				ExtractPart::Headers
			} else if payload {
				ExtractPart::Payload
			} else {
				ExtractPart::Record
			};
			commands::extract(&path, index, part, out).await
		}
		Commands::Recompress { verbose, src, dst } => {
			commands::recompress(&src, &dst, verbose, out).await
		}
	};

	match result {
		Ok(code) => code,
		Err(err) => {
			tracing::debug!(error = %err, "command failed");
			eprintln!("Error: {}", err);
			1
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;

	#[rstest]
	fn parses_extract_flags() {
		let cli = Cli::try_parse_from(["strata-warc", "extract", "--headers", "a.warc", "3"]).unwrap();
		match cli.command {
			Commands::Extract {
				headers,
				payload,
				path,
				index,
			} => {
				assert!(headers);
				assert!(!payload);
				assert_eq!(path, "a.warc");
				assert_eq!(index, 3);
			}
			other => panic!("unexpected command {:?}", other),
		}
	}

	#[rstest]
	fn headers_and_payload_conflict() {
		let result = Cli::try_parse_from(["strata-warc", "extract", "--headers", "--payload", "a", "0"]);
		assert!(result.is_err());
	}

	#[rstest]
	#[tokio::test]
	async fn unknown_command_exits_with_usage_code() {
		let mut out = Vec::new();
		assert_eq!(run(["frobnicate"], &mut out).await, 2);
	}
}
