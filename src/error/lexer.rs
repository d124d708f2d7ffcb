/// A specific lexing error with line number and type.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("line {line}: {type}")]
pub struct LexerError {
	/// The line number where the error occurred.
	pub line:   usize,
	/// The type of lexing error.
	pub r#type: LexerErrorType,
}

impl LexerError {
	pub fn new(line: usize, r#type: LexerErrorType) -> Self { Self { line, r#type } }
}

/// Types of lexing errors.
#[derive(Debug, Clone, PartialEq)]
pub enum LexerErrorType {
	/// Input ended while inside a `{$ ... $}` tag.
	UnterminatedTag,
	/// A `$` inside a tag that is not followed by `}`.
	MalformedTagClose,
	/// Input ended inside a string literal.
	UnterminatedString,
	/// An escape sequence that is not allowed in the current position.
	InvalidEscape(String),
	/// A numeric literal that is neither an integer nor a double.
	InvalidNumber(String),
	/// A character that can't start any token inside a tag.
	UnexpectedCharacter(char),
	/// A token was requested after end of input had been returned.
	ExhaustedInput,
}

impl std::fmt::Display for LexerErrorType {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		use LexerErrorType::*;
		match self {
			UnterminatedTag => {
				write!(f, "Unterminated tag")
			}
			MalformedTagClose => {
				write!(f, "Malformed tag close, expected '$}}'")
			}
			UnterminatedString => {
				write!(f, "Unterminated string")
			}
			InvalidEscape(sequence) => {
				write!(f, "Invalid escape sequence '{sequence}'")
			}
			InvalidNumber(literal) => {
				write!(f, "Invalid number literal '{literal}'")
			}
			UnexpectedCharacter(c) => {
				write!(f, "Unexpected character '{c}'")
			}
			ExhaustedInput => {
				write!(f, "No more tokens, end of input was already reached")
			}
		}
	}
}
