/// Errors raised by the request context
#[derive(thiserror::Error, Debug)]
pub enum ContextError {
	/// Response metadata can't change once the header went out
	#[error("The response header has already been sent")]
	HeaderSent,
	/// Only a few charsets can be produced from Rust strings
	#[error("Unsupported encoding '{0}'")]
	UnsupportedEncoding(String),
	/// Writing to the client failed
	#[error("Failed write response: {0}")]
	Io(#[from] std::io::Error),
}
