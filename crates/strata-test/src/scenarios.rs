//! Backend-agnostic scenarios.
//!
//! Each scenario takes only a URI prefix (`s3://bucket/ns`, `/tmp/dir`,
//! `file:///tmp/dir`) and runs the same operations whatever backend the
//! prefix resolves to. Scenarios assert and panic on failure.

use crate::data::example_warc_gz;

/// Number of records in `example.warc.gz`.
pub const EXAMPLE_RECORD_COUNT: usize = 6;

/// `WARC-Filename` of the warcinfo record in `example.warc.gz`.
pub const EXAMPLE_WARC_FILENAME: &str = "temp-20170306040353.warc.gz";

fn join(prefix: &str, name: &str) -> String {
	format!("{}/{}", prefix.trim_end_matches('/'), name)
}

/// Run the `strata-warc` entry point in-process and return its stdout.
///
/// Panics if the exit code differs from `expected_exit`.
pub async fn run_command(args: &[&str], expected_exit: i32) -> String {
	let mut out = Vec::new();
	let code = strata_warc::run(args.iter().copied(), &mut out).await;
	let output = String::from_utf8_lossy(&out).into_owned();
	assert_eq!(
		code, expected_exit,
		"`strata-warc {}` exited with {}; output:\n{}",
		args.join(" "),
		code,
		output
	);
	output
}

/// Write `"foo"` under the prefix and read it back.
pub async fn round_trip(prefix: &str) {
	let uri = join(prefix, "foo.text");
	strata_storages::open::write(&uri, b"foo")
		.await
		.unwrap_or_else(|e| panic!("write {} failed: {}", uri, e));
	let content = strata_storages::open::read_to_string(&uri)
		.await
		.unwrap_or_else(|e| panic!("read {} failed: {}", uri, e));
	assert_eq!(content, "foo");
}

/// Recompress the example archive to the prefix and check the report.
pub async fn recompress_and_verify(prefix: &str) {
	let src = example_warc_gz();
	let src = src.to_string_lossy();
	let dst = join(prefix, "foo.warc.gz");

	let output = run_command(&["recompress", "-v", &src, &dst], 0).await;

	assert!(output.contains(r#"{"offset": "0", "warc-type": "warcinfo"}"#), "{}", output);
	assert!(output.contains(r#""warc-target-uri": "http://example.com/""#), "{}", output);
	assert!(output.contains("No Errors Found!"), "{}", output);
	assert!(
		output.contains(&format!("{} records read", EXAMPLE_RECORD_COUNT)),
		"{}",
		output
	);
	assert!(!output.contains("Invalid"), "{}", output);
}

/// Copy the example archive to the prefix, then check and extract the copy.
pub async fn copy_then_inspect(prefix: &str) {
	let content = tokio::fs::read(example_warc_gz())
		.await
		.unwrap_or_else(|e| panic!("cannot read example archive: {}", e));
	let copy = join(prefix, "example.warc.gz");
	strata_storages::open::write(&copy, &content)
		.await
		.unwrap_or_else(|e| panic!("write {} failed: {}", copy, e));

	let checked = run_command(&["check", "-v", &copy], 0).await;
	assert!(!checked.contains("Invalid"), "{}", checked);
	assert!(checked.contains("No Errors Found!"), "{}", checked);

	let extracted = run_command(&["extract", &copy, "0"], 0).await;
	assert!(
		extracted.contains(&format!("WARC-Filename: {}", EXAMPLE_WARC_FILENAME)),
		"{}",
		extracted
	);
}
