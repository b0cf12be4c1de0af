//! Background HTTP server used by the emulator and the mock HTTP fixture.
//!
//! The listener is bound on the caller's thread, so bind failures surface
//! immediately. The accept loop then runs on a dedicated thread with its own
//! runtime and reports readiness over a channel before the constructor
//! returns. Dropping the server signals shutdown and joins the thread, which
//! closes the listening socket.

use std::convert::Infallible;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::sync::mpsc;
use std::thread::JoinHandle;

use async_trait::async_trait;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// Request handler run by a [`BackgroundServer`].
#[async_trait]
pub trait Handler: Send + Sync + 'static {
	async fn handle(&self, request: Request<Incoming>) -> Response<Full<Bytes>>;
}

/// An HTTP/1 server running on its own thread.
#[derive(Debug)]
pub struct BackgroundServer {
	addr: SocketAddr,
	shutdown: Option<broadcast::Sender<()>>,
	thread: Option<JoinHandle<()>>,
}

impl BackgroundServer {
	/// Bind `addr` and start serving `handler`.
	///
	/// Returns once the accept loop is running.
	pub fn start(addr: SocketAddr, handler: Arc<dyn Handler>) -> std::io::Result<Self> {
		let std_listener = StdTcpListener::bind(addr)?;
		std_listener.set_nonblocking(true)?;
		let addr = std_listener.local_addr()?;

		let (shutdown_tx, _) = broadcast::channel::<()>(1);
		let (ready_tx, ready_rx) = mpsc::channel::<std::io::Result<()>>();
		let shutdown = shutdown_tx.clone();

		let thread = std::thread::Builder::new()
			.name(format!("strata-test-server-{}", addr.port()))
			.spawn(move || {
				let runtime = match tokio::runtime::Builder::new_current_thread()
					.enable_all()
					.build()
				{
					Ok(runtime) => runtime,
					Err(e) => {
						let _ = ready_tx.send(Err(e));
						return;
					}
				};
				runtime.block_on(serve(std_listener, handler, shutdown, ready_tx));
			})?;

		match ready_rx.recv() {
			Ok(Ok(())) => {}
			Ok(Err(e)) => {
				let _ = thread.join();
				return Err(e);
			}
			Err(_) => {
				let _ = thread.join();
				return Err(std::io::Error::other("server thread exited before becoming ready"));
			}
		}

		tracing::debug!(%addr, "background server ready");
		Ok(Self {
			addr,
			shutdown: Some(shutdown_tx),
			thread: Some(thread),
		})
	}

	pub fn local_addr(&self) -> SocketAddr {
		self.addr
	}

	/// Stop accepting, drop open connections and join the server thread.
	///
	/// Idempotent.
	pub fn stop(&mut self) {
		if let Some(shutdown) = self.shutdown.take() {
			let _ = shutdown.send(());
		}
		if let Some(thread) = self.thread.take() {
			if thread.join().is_err() {
				tracing::warn!(addr = %self.addr, "background server thread panicked");
			}
			tracing::debug!(addr = %self.addr, "background server stopped");
		}
	}
}

impl Drop for BackgroundServer {
	fn drop(&mut self) {
		self.stop();
	}
}

async fn serve(
	std_listener: StdTcpListener,
	handler: Arc<dyn Handler>,
	shutdown: broadcast::Sender<()>,
	ready: mpsc::Sender<std::io::Result<()>>,
) {
	let mut shutdown_rx = shutdown.subscribe();
	let listener = match TcpListener::from_std(std_listener) {
		Ok(listener) => listener,
		Err(e) => {
			let _ = ready.send(Err(e));
			return;
		}
	};
	let _ = ready.send(Ok(()));

	loop {
		tokio::select! {
			result = listener.accept() => {
				let (stream, peer) = match result {
					Ok(accepted) => accepted,
					Err(e) => {
						tracing::warn!(error = %e, "accept failed");
						continue;
					}
				};
				let handler = Arc::clone(&handler);
				let mut conn_shutdown = shutdown.subscribe();

				tokio::spawn(async move {
					let service = service_fn(move |request| {
						let handler = Arc::clone(&handler);
						async move { Ok::<_, Infallible>(handler.handle(request).await) }
					});
					tokio::select! {
						result = http1::Builder::new().serve_connection(TokioIo::new(stream), service) => {
							if let Err(err) = result {
								tracing::debug!(%peer, error = %err, "connection error");
							}
						}
						_ = conn_shutdown.recv() => {}
					}
				});
			}
			_ = shutdown_rx.recv() => {
				break;
			}
		}
	}
}

/// Plain-text response with `status`.
pub(crate) fn text_response(status: hyper::StatusCode, body: &'static str) -> Response<Full<Bytes>> {
	let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
	*response.status_mut() = status;
	response.headers_mut().insert(
		hyper::header::CONTENT_TYPE,
		hyper::header::HeaderValue::from_static("text/plain"),
	);
	response
}

#[cfg(test)]
mod tests {
	use super::*;
	use rstest::rstest;
	use std::net::TcpStream;

	struct Hello;

	#[async_trait]
	impl Handler for Hello {
		async fn handle(&self, _request: Request<Incoming>) -> Response<Full<Bytes>> {
			text_response(hyper::StatusCode::OK, "hello")
		}
	}

	#[rstest]
	fn accepts_connections_until_dropped() {
		let server = BackgroundServer::start("127.0.0.1:0".parse().unwrap(), Arc::new(Hello)).unwrap();
		let addr = server.local_addr();
		assert!(TcpStream::connect(addr).is_ok());

		drop(server);
		assert!(TcpStream::connect(addr).is_err());
	}

	#[rstest]
	fn bind_conflict_fails_immediately() {
		let server = BackgroundServer::start("127.0.0.1:0".parse().unwrap(), Arc::new(Hello)).unwrap();
		let result = BackgroundServer::start(server.local_addr(), Arc::new(Hello));
		assert!(result.is_err());
	}
}
