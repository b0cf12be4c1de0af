//! Test data shipped with this crate.

use std::path::PathBuf;

/// Path of `name` under this crate's `tests/data` directory.
pub fn get_test_file(name: &str) -> PathBuf {
	PathBuf::from(env!("CARGO_MANIFEST_DIR"))
		.join("tests")
		.join("data")
		.join(name)
}

/// Multi-record archive, one gzip member per record.
pub fn example_warc_gz() -> PathBuf {
	get_test_file("example.warc.gz")
}

/// The same records as [`example_warc_gz`], uncompressed.
pub fn example_warc() -> PathBuf {
	get_test_file("example.warc")
}
