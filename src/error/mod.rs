pub mod context;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod server;

use crate::error::{interpreter::InterpreterError, parser::ParserError};

/// ScriptError is the top-level error type for running a template.
#[derive(thiserror::Error, Debug)]
pub enum ScriptError {
	/// Internal engine error, e.g. the template file could not be read
	#[error("ScriptInternalError: {0}")]
	InternalError(#[from] anyhow::Error),
	/// The template text is malformed
	#[error("{0}")]
	ParserError(#[from] ParserError),
	/// Evaluation of a well formed template failed
	#[error("Runtime error: {0}")]
	RuntimeError(#[from] InterpreterError),
}
