use std::{collections::HashMap, fs::read_to_string, path::{Path, PathBuf}, time::Duration};

use anyhow::{Context, ensure};
use serde::Deserialize;

/// Fallback for extensions missing from the mime table.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Server configuration, loaded once before the server starts.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
	#[serde(default = "default_address")]
	pub address:         String,
	/// Cookie domain used when a request carries no `Host` header.
	#[serde(default = "default_domain")]
	pub domain:          String,
	#[serde(default = "default_port")]
	pub port:            u16,
	#[serde(default = "default_worker_threads")]
	pub worker_threads:  usize,
	pub document_root:   PathBuf,
	/// Session lifetime in seconds.
	#[serde(default = "default_session_timeout")]
	pub session_timeout: u64,
	/// Seconds between two sweeps of expired sessions.
	#[serde(default = "default_sweep_interval")]
	pub sweep_interval:  u64,
	/// File extension to mime type.
	#[serde(default)]
	pub mime_types:      HashMap<String, String>,
	/// URL path to worker name.
	#[serde(default)]
	pub workers:         HashMap<String, String>,
}

fn default_address() -> String { "127.0.0.1".to_string() }

fn default_domain() -> String { "localhost".to_string() }

fn default_port() -> u16 { 5721 }

fn default_worker_threads() -> usize { 10 }

fn default_session_timeout() -> u64 { 600 }

fn default_sweep_interval() -> u64 { 300 }

impl ServerConfig {
	/// A configuration with defaults for everything but the document root.
	pub fn new(document_root: impl Into<PathBuf>) -> Self {
		Self {
			address:         default_address(),
			domain:          default_domain(),
			port:            default_port(),
			worker_threads:  default_worker_threads(),
			document_root:   document_root.into(),
			session_timeout: default_session_timeout(),
			sweep_interval:  default_sweep_interval(),
			mime_types:      HashMap::new(),
			workers:         HashMap::new(),
		}
	}

	/// Read a JSON configuration file. A relative document root is resolved
	/// against the directory of the file.
	pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
		let path = path.as_ref();
		let text = read_to_string(path).with_context(|| format!("Failed read config {}", path.display()))?;
		let mut config: Self =
			serde_json::from_str(&text).with_context(|| format!("Failed parse config {}", path.display()))?;
		if config.document_root.is_relative() {
			let base = path.parent().unwrap_or_else(|| Path::new("."));
			config.document_root = base.join(&config.document_root);
		}
		config.validate()?;
		Ok(config)
	}

	pub fn validate(&self) -> anyhow::Result<()> {
		ensure!(self.worker_threads > 0, "workerThreads must be positive");
		ensure!(self.sweep_interval > 0, "sweepInterval must be positive");
		ensure!(
			self.document_root.is_dir(),
			"documentRoot {} is not a directory",
			self.document_root.display()
		);
		for path in self.workers.keys() {
			ensure!(path.starts_with('/'), "worker path '{path}' must start with '/'");
		}
		Ok(())
	}

	pub fn mime_type(&self, extension: &str) -> &str {
		self.mime_types.get(extension).map(String::as_str).unwrap_or(DEFAULT_MIME_TYPE)
	}

	pub fn session_timeout(&self) -> Duration { Duration::from_secs(self.session_timeout) }

	pub fn sweep_interval(&self) -> Duration { Duration::from_secs(self.sweep_interval) }
}

#[cfg(test)]
mod tests {
	use std::fs;

	use super::*;

	#[test]
	fn load_config_with_defaults() {
		let dir = tempfile::tempdir().unwrap();
		fs::create_dir(dir.path().join("webroot")).unwrap();
		let path = dir.path().join("server.json");
		fs::write(
			&path,
			r#"{
				"port": 8080,
				"documentRoot": "webroot",
				"mimeTypes": { "html": "text/html", "png": "image/png" },
				"workers": { "/hello": "HelloWorker" }
			}"#,
		)
		.unwrap();

		let config = ServerConfig::load(&path).unwrap();
		assert_eq!(config.port, 8080);
		assert_eq!(config.address, "127.0.0.1");
		assert_eq!(config.worker_threads, 10);
		assert_eq!(config.session_timeout(), Duration::from_secs(600));
		assert_eq!(config.document_root, dir.path().join("webroot"));
		assert_eq!(config.mime_type("png"), "image/png");
		assert_eq!(config.mime_type("zip"), DEFAULT_MIME_TYPE);
		assert_eq!(config.workers.get("/hello").map(String::as_str), Some("HelloWorker"));
	}

	#[test]
	fn reject_invalid_config() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("server.json");

		fs::write(&path, r#"{ "documentRoot": "missing" }"#).unwrap();
		assert!(ServerConfig::load(&path).is_err());

		fs::write(&path, r#"{ "documentRoot": ".", "workerThreads": 0 }"#).unwrap();
		assert!(ServerConfig::load(&path).is_err());

		fs::write(&path, r#"{ "documentRoot": ".", "workers": { "hello": "HelloWorker" } }"#).unwrap();
		assert!(ServerConfig::load(&path).is_err());

		fs::write(&path, "not json").unwrap();
		assert!(ServerConfig::load(&path).is_err());
	}
}
