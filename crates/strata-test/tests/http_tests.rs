//! Mock HTTP fixture tests.

use std::net::TcpStream;

use rstest::rstest;
use strata_test::data::{example_warc, example_warc_gz};
use strata_test::http::MockHttpServer;
use strata_test::init_test_logging;
use strata_test::scenarios::run_command;

#[rstest]
#[tokio::test]
async fn read_served_file_through_open() {
	init_test_logging();
	let server = MockHttpServer::serve(&example_warc(), None).unwrap();

	let content = strata_storages::open::read_to_string(&server.url())
		.await
		.unwrap();
	assert!(content.contains("WARC-Record-ID: <urn:uuid:e9a0cecc-0221-11e7-adb1"));
}

#[rstest]
#[tokio::test]
async fn check_archive_over_http() {
	let server = MockHttpServer::serve(&example_warc_gz(), None).unwrap();
	assert!(server.url().ends_with("/example.warc.gz"));

	let output = run_command(&["check", "-v", &server.url()], 0).await;
	assert!(output.contains("No Errors Found!"));
	assert!(!output.contains("Invalid"));
}

#[rstest]
#[tokio::test]
async fn custom_serve_path_and_headers() {
	let server = MockHttpServer::serve(&example_warc_gz(), Some("/crawl/segment.warc.gz")).unwrap();
	let expected = std::fs::read(example_warc_gz()).unwrap();

	let response = reqwest::get(server.url()).await.unwrap();
	assert_eq!(response.status(), reqwest::StatusCode::OK);
	assert_eq!(
		response.headers()[reqwest::header::CONTENT_TYPE],
		"application/gzip"
	);
	assert_eq!(
		response.headers()[reqwest::header::CONTENT_LENGTH],
		expected.len().to_string().as_str()
	);
	assert_eq!(response.bytes().await.unwrap().as_ref(), expected.as_slice());
}

#[rstest]
#[case("/")]
#[case("/other.warc")]
#[case("/example.warc/extra")]
#[tokio::test]
async fn other_paths_are_not_found(#[case] path: &str) {
	let server = MockHttpServer::serve(&example_warc(), None).unwrap();

	let response = reqwest::get(format!("{}{}", server.base_url(), path))
		.await
		.unwrap();
	assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
	assert_eq!(response.text().await.unwrap(), "Not Found");
}

#[rstest]
fn port_is_released_on_drop() {
	let server = MockHttpServer::serve(&example_warc(), None).unwrap();
	let addr = format!("127.0.0.1:{}", server.port());
	assert!(TcpStream::connect(&addr).is_ok());

	drop(server);
	assert!(TcpStream::connect(&addr).is_err());
}

#[rstest]
fn servers_get_distinct_ports() {
	let first = MockHttpServer::serve(&example_warc(), None).unwrap();
	let second = MockHttpServer::serve(&example_warc(), None).unwrap();
	assert_ne!(first.port(), second.port());
}
