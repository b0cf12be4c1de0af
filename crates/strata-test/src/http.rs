//! Serving a single file over a throwaway local HTTP endpoint.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use http_body_util::Full;
use hyper::body::Incoming;

use crate::server::{BackgroundServer, Handler, text_response};
use crate::{HarnessError, HarnessResult};

/// A file snapshotted at server start and the URL path it is served under.
#[derive(Debug, Clone)]
pub struct ServedFile {
	pub path: PathBuf,
	pub serve_path: String,
	pub content: Bytes,
	pub content_type: &'static str,
}

impl ServedFile {
	/// Read `path` fully into memory.
	///
	/// `serve_path` defaults to `/<file name>` and always starts with `/`.
	pub fn load(path: &Path, serve_path: Option<&str>) -> HarnessResult<Self> {
		let content = Bytes::from(std::fs::read(path)?);
		let serve_path = match serve_path {
			Some(p) if p.starts_with('/') => p.to_string(),
			Some(p) => format!("/{}", p),
			None => {
				let name = path.file_name().ok_or_else(|| {
					HarnessError::Config(format!("{} has no file name", path.display()))
				})?;
				format!("/{}", name.to_string_lossy())
			}
		};

		Ok(Self {
			path: path.to_path_buf(),
			serve_path,
			content,
			content_type: content_type_for(path),
		})
	}
}

/// Guess a `Content-Type` from the file extension.
pub fn content_type_for(path: &Path) -> &'static str {
	match path.extension().and_then(|e| e.to_str()) {
		Some("gz") => "application/gzip",
		_ => "application/octet-stream",
	}
}

struct SingleFile(ServedFile);

#[async_trait]
impl Handler for SingleFile {
	async fn handle(&self, request: Request<Incoming>) -> Response<Full<Bytes>> {
		let file = &self.0;
		if request.uri().path() != file.serve_path {
			tracing::trace!(path = %request.uri().path(), "mock HTTP miss");
			return text_response(StatusCode::NOT_FOUND, "Not Found");
		}

		let body = if request.method() == Method::HEAD {
			Bytes::new()
		} else {
			file.content.clone()
		};
		let mut response = Response::new(Full::new(body));
		let headers = response.headers_mut();
		headers.insert(
			header::CONTENT_TYPE,
			HeaderValue::from_static(file.content_type),
		);
		headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.content.len()));
		response
	}
}

/// Local HTTP server serving one file until dropped.
///
/// ```rust,no_run
/// use strata_test::http::MockHttpServer;
///
/// let server = MockHttpServer::serve("tests/data/example.warc".as_ref(), None).unwrap();
/// assert!(server.url().ends_with("/example.warc"));
/// ```
#[derive(Debug)]
pub struct MockHttpServer {
	serve_path: String,
	server: BackgroundServer,
}

impl MockHttpServer {
	/// Snapshot `file_path` and serve it on an ephemeral port.
	///
	/// Returns once the listener accepts connections.
	pub fn serve(file_path: &Path, serve_path: Option<&str>) -> HarnessResult<Self> {
		let file = ServedFile::load(file_path, serve_path)?;
		let serve_path = file.serve_path.clone();
		let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, 0));
		let server = BackgroundServer::start(addr, Arc::new(SingleFile(file)))
			.map_err(HarnessError::ServerStart)?;

		let mock = Self { serve_path, server };
		tracing::debug!(url = %mock.url(), "serving file over HTTP");
		Ok(mock)
	}

	/// `http://127.0.0.1:<port>`
	pub fn base_url(&self) -> String {
		format!("http://{}", self.server.local_addr())
	}

	/// Full URL of the served file.
	pub fn url(&self) -> String {
		format!("{}{}", self.base_url(), self.serve_path)
	}

	pub fn port(&self) -> u16 {
		self.server.local_addr().port()
	}
}
