use crate::error::lexer::LexerError;

/// Parser related errors
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ParserError {
	/// The lexer could not produce the next token
	#[error("Lexer error: {0}")]
	LexerError(#[from] LexerError),
	/// The token stream doesn't form a valid document
	#[error(transparent)]
	ParseError(#[from] ParseError),
}

/// A specific parsing error with line number and type.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("line {line}: {type}")]
pub struct ParseError {
	pub line:   usize,
	pub r#type: ParseErrorType,
}

impl ParseError {
	pub fn new(line: usize, r#type: ParseErrorType) -> Self { Self { line, r#type } }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ParseErrorType {
	/// A `FOR` tag whose matching `END` never came.
	UnclosedFor(String),
	/// An `END` tag with no open `FOR`.
	UnexpectedEnd,
	/// A tag whose name is neither `=`, `FOR` nor `END`.
	UnknownTag(String),
	/// An echo tag containing something that is not an element.
	MalformedEcho(String),
	/// A `FOR` tag with a bad variable or a wrong argument list.
	MalformedFor(String),
	/// Anything after `END` but the tag close.
	MalformedEnd(String),
}

impl std::fmt::Display for ParseErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use ParseErrorType::*;
		match self {
			UnclosedFor(variable) => {
				write!(f, "FOR loop over '{variable}' is never closed with END")
			}
			UnexpectedEnd => {
				write!(f, "END tag without an open FOR loop")
			}
			UnknownTag(name) => {
				write!(f, "Unknown tag '{name}'")
			}
			MalformedEcho(reason) => {
				write!(f, "Malformed echo tag: {reason}")
			}
			MalformedFor(reason) => {
				write!(f, "Malformed FOR tag: {reason}")
			}
			MalformedEnd(found) => {
				write!(f, "Malformed END tag, unexpected '{found}'")
			}
		}
	}
}
