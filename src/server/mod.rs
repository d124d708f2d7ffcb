//! A small threaded HTTP/1.1 server hosting SmartScript pages.
//!
//! One acceptor thread hands connections to a [`WorkerPool`]; each connection
//! serves exactly one GET request and is closed afterwards. A sweeper thread
//! periodically drops expired sessions.

mod config;
mod pool;
mod request;
mod session;
mod workers;

use std::{
	collections::HashMap,
	fs,
	io::{self, BufReader, BufWriter},
	net::{SocketAddr, TcpListener, TcpStream},
	path::{Path, PathBuf},
	sync::{Arc, atomic::{AtomicBool, Ordering}},
	thread::{Builder, JoinHandle},
};

use anyhow::{Context, anyhow};
pub use config::{DEFAULT_MIME_TYPE, ServerConfig};
use crossbeam::channel::{RecvTimeoutError, Sender, bounded};
pub use pool::WorkerPool;
pub use request::{MAX_HEADER_SIZE, RequestHeader, parse_query, read_request};
pub use session::{SESSION_ID_LENGTH, SessionStore};
use tracing::{debug, error, info, trace, warn};
pub use workers::{Worker, WorkerRegistry};

use crate::{
	context::{Cookie, Dispatcher, PersistentParameters, RequestContext},
	engine::ScriptEngine,
	error::{context::ContextError, server::ServerError},
};

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sid";

/// Extension of script pages.
pub const SCRIPT_EXTENSION: &str = "smscr";

/// Directory under the document root that only internal dispatch may reach.
pub const PRIVATE_DIR: &str = "private";

pub struct SmartServer {
	config:   ServerConfig,
	registry: WorkerRegistry,
}

impl SmartServer {
	/// A server with the built-in workers registered.
	pub fn new(config: ServerConfig) -> Self { Self { config, registry: WorkerRegistry::with_builtin() } }

	pub fn register_worker<F>(&mut self, name: impl Into<String>, worker: F)
	where
		F: Fn(&mut RequestContext<'_>) -> Result<(), ServerError> + Send + Sync + 'static,
	{
		self.registry.register(name, worker);
	}

	/// Bind the listener and start serving in the background.
	pub fn start(self) -> anyhow::Result<ServerHandle> {
		let Self { config, registry } = self;
		config.validate()?;

		let mut routes = HashMap::new();
		for (path, name) in &config.workers {
			let worker = registry.get(name).ok_or_else(|| anyhow!("Unknown worker '{name}' for route '{path}'"))?;
			routes.insert(path.clone(), worker);
		}
		let document_root = fs::canonicalize(&config.document_root)
			.with_context(|| format!("Failed resolve document root {}", config.document_root.display()))?;

		let listener = TcpListener::bind((config.address.as_str(), config.port))
			.with_context(|| format!("Failed bind {}:{}", config.address, config.port))?;
		let local_addr = listener.local_addr()?;
		let pool = WorkerPool::new(config.worker_threads)?;

		let state = Arc::new(ServerState {
			sessions: SessionStore::new(config.session_timeout()),
			sweep_interval: config.sweep_interval(),
			document_root,
			routes,
			registry,
			config,
		});
		let stopped = Arc::new(AtomicBool::new(false));
		let (shutdown, shutdown_signal) = bounded::<()>(1);

		let sweeper = {
			let state = state.clone();
			Builder::new().name("smartserver-sweeper".to_string()).spawn(move || {
				loop {
					match shutdown_signal.recv_timeout(state.sweep_interval) {
						Err(RecvTimeoutError::Timeout) => {
							let removed = state.sessions.sweep();
							trace!(removed, remaining = state.sessions.len(), "session sweep");
						}
						_ => break,
					}
				}
			})?
		};

		let acceptor = {
			let stopped = stopped.clone();
			Builder::new().name("smartserver-acceptor".to_string()).spawn(move || {
				let mut pool = pool;
				for stream in listener.incoming() {
					if stopped.load(Ordering::SeqCst) {
						break;
					}
					match stream {
						Ok(stream) => {
							let state = state.clone();
							pool.execute(move || state.handle_connection(stream));
						}
						Err(e) => warn!("Failed accept connection: {e}"),
					}
				}
				pool.shutdown();
			})?
		};

		info!(address = %local_addr, "server started");
		Ok(ServerHandle {
			local_addr,
			stopped,
			shutdown: Some(shutdown),
			acceptor: Some(acceptor),
			sweeper: Some(sweeper),
		})
	}
}

/// Control over a running server.
pub struct ServerHandle {
	local_addr: SocketAddr,
	stopped:    Arc<AtomicBool>,
	shutdown:   Option<Sender<()>>,
	acceptor:   Option<JoinHandle<()>>,
	sweeper:    Option<JoinHandle<()>>,
}

impl ServerHandle {
	pub fn local_addr(&self) -> SocketAddr { self.local_addr }

	/// Stop accepting, finish the requests in flight and join all threads.
	pub fn stop(&mut self) {
		if self.stopped.swap(true, Ordering::SeqCst) {
			return;
		}
		// Wake the acceptor blocked in `accept`.
		let _ = TcpStream::connect(wake_address(self.local_addr));
		self.shutdown.take();
		self.join();
		info!(address = %self.local_addr, "server stopped");
	}

	/// Block until the server threads end.
	pub fn wait(mut self) { self.join(); }

	fn join(&mut self) {
		for thread in [self.acceptor.take(), self.sweeper.take()].into_iter().flatten() {
			if thread.join().is_err() {
				error!("server thread panicked");
			}
		}
	}
}

impl Drop for ServerHandle {
	fn drop(&mut self) { self.stop(); }
}

/// An unspecified bind address can't be connected to on every platform.
fn wake_address(mut address: SocketAddr) -> SocketAddr {
	if address.ip().is_unspecified() {
		match address {
			SocketAddr::V4(_) => address.set_ip([127, 0, 0, 1].into()),
			SocketAddr::V6(_) => address.set_ip(std::net::Ipv6Addr::LOCALHOST.into()),
		}
	}
	address
}

/// Shared state of a running server
struct ServerState {
	config:         ServerConfig,
	document_root:  PathBuf,
	routes:         HashMap<String, Worker>,
	registry:       WorkerRegistry,
	sessions:       SessionStore,
	sweep_interval: std::time::Duration,
}

impl Dispatcher for ServerState {
	fn dispatch_request(&self, path: &str, context: &mut RequestContext<'_>) -> Result<(), ServerError> {
		self.route(path, context, false)
	}
}

impl ServerState {
	fn handle_connection(self: &Arc<Self>, stream: TcpStream) {
		let peer = stream.peer_addr().ok();
		let mut reader = match stream.try_clone() {
			Ok(stream) => BufReader::new(stream),
			Err(e) => {
				warn!("Failed clone connection: {e}");
				return;
			}
		};
		let mut writer = BufWriter::new(stream);

		let header = match read_request(&mut reader) {
			Ok(Some(header)) => header,
			Ok(None) => return,
			Err(e) => {
				warn!(?peer, "Rejected request: {e}");
				let mut context = RequestContext::new(&mut writer, HashMap::new(), PersistentParameters::new());
				send_error(&mut context, &e);
				let _ = context.flush();
				return;
			}
		};
		debug!(?peer, path = %header.path, "request");

		let host = header.host().unwrap_or_else(|| self.config.domain.clone());
		let (sid, persistent) = self.sessions.resolve(header.cookie(SESSION_COOKIE).as_deref(), &host);
		let mut context =
			RequestContext::new(&mut writer, header.parameters(), persistent).with_dispatcher(self.clone());
		let cookie = Cookie::new(SESSION_COOKIE, sid).with_domain(host).with_path("/").http_only();
		if let Err(e) = context.add_cookie(cookie) {
			warn!("Failed set session cookie: {e}");
		}

		if let Err(e) = self.route(&header.path, &mut context, true) {
			match e {
				ServerError::NotFound(_) | ServerError::Forbidden(_) => debug!(path = %header.path, "{e}"),
				_ => warn!(path = %header.path, "Failed serve request: {e}"),
			}
			if !context.header_sent() {
				send_error(&mut context, &e);
			}
		}
		if let Err(e) = context.flush() {
			debug!(?peer, "Failed flush response: {e}");
		}
	}

	/// Resolve `path` and produce its response. `direct` marks a client
	/// request, which can't reach the private directory.
	fn route(&self, path: &str, context: &mut RequestContext<'_>, direct: bool) -> Result<(), ServerError> {
		let segments = normalize(path)?;
		if direct && segments.first() == Some(&PRIVATE_DIR) {
			return Err(ServerError::NotFound(path.to_string()));
		}

		if let Some(worker) = self.routes.get(path) {
			debug!(path, "route");
			return worker(context);
		}
		if let Some(name) = path.strip_prefix("/ext/") {
			let worker = self.registry.get(name).ok_or_else(|| ServerError::NotFound(path.to_string()))?;
			debug!(path, worker = name, "worker");
			return worker(context);
		}

		let file = segments.iter().fold(self.document_root.clone(), |file, segment| file.join(segment));
		if !file.is_file() {
			return Err(ServerError::NotFound(path.to_string()));
		}
		let file = self.confine(&file, path)?;
		let extension = file.extension().and_then(|e| e.to_str()).map(str::to_ascii_lowercase).unwrap_or_default();

		if extension == SCRIPT_EXTENSION {
			debug!(path, "script");
			return Ok(ScriptEngine.run_file(&file, context)?);
		}

		let body = fs::read(&file).map_err(|e| unreadable(e, path))?;
		context.set_mime_type(self.config.mime_type(&extension))?;
		context.set_content_length(body.len() as u64)?;
		Ok(context.write(&body)?)
	}

	/// Resolve links and make sure the file still lies under the document root.
	fn confine(&self, file: &Path, path: &str) -> Result<PathBuf, ServerError> {
		let file = fs::canonicalize(file)?;
		if !file.starts_with(&self.document_root) {
			return Err(ServerError::Forbidden(path.to_string()));
		}
		Ok(file)
	}
}

/// Split a request path into segments, resolving `.` and `..`.
///
/// Climbing above the document root is forbidden.
fn normalize(path: &str) -> Result<Vec<&str>, ServerError> {
	let mut segments = Vec::new();
	for segment in path.split('/') {
		match segment {
			"" | "." => {}
			".." => {
				if segments.pop().is_none() {
					return Err(ServerError::Forbidden(path.to_string()));
				}
			}
			s if s.contains(['\\', '\0']) => return Err(ServerError::Forbidden(path.to_string())),
			s => segments.push(s),
		}
	}
	Ok(segments)
}

/// A file the server may not read is treated as missing.
fn unreadable(error: io::Error, path: &str) -> ServerError {
	match error.kind() {
		io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound => ServerError::NotFound(path.to_string()),
		_ => ServerError::Io(error),
	}
}

/// Turn the pending response into an empty-bodied error status.
fn send_error(context: &mut RequestContext<'_>, error: &ServerError) {
	if let Err(e) = write_status(context, error.status()) {
		debug!("Failed send error status: {e}");
	}
}

fn write_status(context: &mut RequestContext<'_>, (code, text): (u16, &str)) -> Result<(), ContextError> {
	context.set_status_code(code)?;
	context.set_status_text(text)?;
	context.set_mime_type("text/plain")?;
	context.set_content_length(0)?;
	context.write(&[])
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn normalize_paths() {
		assert_eq!(normalize("/").unwrap(), Vec::<&str>::new());
		assert_eq!(normalize("/a/./b//c").unwrap(), vec!["a", "b", "c"]);
		assert_eq!(normalize("/a/b/../c").unwrap(), vec!["a", "c"]);
		assert!(matches!(normalize("/../etc/passwd"), Err(ServerError::Forbidden(_))));
		assert!(matches!(normalize("/a/../../b"), Err(ServerError::Forbidden(_))));
		assert!(matches!(normalize("/a\\..\\b"), Err(ServerError::Forbidden(_))));
	}

	#[test]
	fn unreadable_file_is_not_found() {
		let denied = io::Error::from(io::ErrorKind::PermissionDenied);
		assert!(matches!(unreadable(denied, "/secret.txt"), ServerError::NotFound(path) if path == "/secret.txt"));
		let broken = io::Error::other("disk failure");
		assert_eq!(unreadable(broken, "/a.txt").status().0, 500);
	}

	#[test]
	fn error_response_has_empty_body() {
		let mut output = Vec::new();
		let mut context = RequestContext::new(&mut output, HashMap::new(), PersistentParameters::new());
		send_error(&mut context, &ServerError::NotFound("/x".to_string()));
		assert!(context.header_sent());
		drop(context);
		let response = String::from_utf8(output).unwrap();
		assert!(response.starts_with("HTTP/1.1 404 Not Found\r\n"));
		assert!(response.contains("Content-Length: 0\r\n"));
		assert!(response.ends_with("\r\n\r\n"));
	}

	#[test]
	fn unspecified_address_wakes_loopback() {
		let address: SocketAddr = "0.0.0.0:8080".parse().unwrap();
		assert_eq!(wake_address(address), "127.0.0.1:8080".parse().unwrap());
		let address: SocketAddr = "127.0.0.1:1".parse().unwrap();
		assert_eq!(wake_address(address), address);
	}
}
