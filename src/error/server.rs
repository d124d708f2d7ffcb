use crate::error::{ScriptError, context::ContextError};

/// Errors that end the processing of a single request.
#[derive(thiserror::Error, Debug)]
pub enum ServerError {
	/// Malformed request line, unsupported method or version
	#[error("Bad request: {0}")]
	BadRequest(String),
	/// The path escapes the document root
	#[error("Forbidden: {0}")]
	Forbidden(String),
	/// No handler, no worker and no file for the path
	#[error("Not found: {0}")]
	NotFound(String),
	/// A script failed to parse or execute
	#[error("Script failed: {0}")]
	ScriptError(#[from] ScriptError),
	#[error(transparent)]
	ContextError(#[from] ContextError),
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl ServerError {
	/// The HTTP status reported to the client for this error.
	pub fn status(&self) -> (u16, &'static str) {
		use ServerError::*;
		match self {
			BadRequest(_) => (400, "Bad Request"),
			Forbidden(_) => (403, "Forbidden"),
			NotFound(_) => (404, "Not Found"),
			ScriptError(_) | ContextError(_) | Io(_) => (500, "Internal Server Error"),
		}
	}
}
