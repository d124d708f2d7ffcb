//! Splits template text into tokens.
//!
//! A template is mostly literal text with `{$ ... $}` tags sprinkled in, so the
//! lexer works in two modes. Outside of tags every character is significant
//! and collected into one text token until the next tag opening; only `\\` and
//! `\{` may be escaped there. Inside a tag whitespace separates tokens and is
//! dropped, and the first token names the tag (`=`, `FOR` or `END`).
//!
//! Tokens are produced on demand through [`Lexer::next_token`], the parser
//! never sees the whole token stream at once.
mod token;

use std::{iter::Peekable, str::CharIndices};

use Operator::*;
use TokenType::*;
pub use token::*;

use crate::error::lexer::{LexerError, LexerErrorType::{self, *}};

/// Where the cursor currently is relative to tags.
#[derive(Debug, Clone, Copy, PartialEq)]
enum LexerState {
	/// Outside of any tag.
	Text,
	/// Right after `{$`, the next token names the tag.
	TagName,
	/// Inside a tag, after its name.
	Tag,
}

/// A lexer for template source
pub struct Lexer<'a> {
	/// User input template
	source:      &'a str,
	/// User input template iterator
	source_iter: Peekable<CharIndices<'a>>,
	/// Points at the beginning of the current lexeme
	start:       usize,
	/// Points right after the character currently being considered
	cursor:      usize,
	/// Line of the cursor, for error reporting
	line:        usize,
	state:       LexerState,
	/// Set once `Eof` has been handed out
	finished:    bool,
}

impl<'a> Lexer<'a> {
	pub fn new(source: &'a str) -> Self {
		let source_iter = source.char_indices().peekable();

		Self { source, source_iter, start: 0, cursor: 0, line: 1, state: LexerState::Text, finished: false }
	}

	/// Produce the next token.
	///
	/// Once [`TokenType::Eof`] has been returned any further call fails.
	pub fn next_token(&mut self) -> Result<Token<'a>, LexerError> {
		if self.finished {
			return Err(self.error(ExhaustedInput));
		}
		self.start = self.cursor;
		match self.state {
			LexerState::Text => self.text_token(),
			LexerState::TagName | LexerState::Tag => self.tag_token(),
		}
	}

	/// Scan a text run or a tag opening.
	fn text_token(&mut self) -> Result<Token<'a>, LexerError> {
		let Some(c) = self.peek() else {
			self.finished = true;
			return Ok(self.token(Eof));
		};
		if c == '{' && self.peek_second() == Some('$') {
			self.advance();
			self.advance();
			self.state = LexerState::TagName;
			return Ok(self.token(TagOpen));
		}

		let mut text = String::new();
		while let Some(c) = self.peek() {
			match c {
				'{' if self.peek_second() == Some('$') => break,
				'\\' => {
					self.advance();
					match self.advance() {
						Some(escaped @ ('\\' | '{')) => text.push(escaped),
						Some(other) => return Err(self.error(InvalidEscape(format!("\\{other}")))),
						None => return Err(self.error(InvalidEscape("\\".to_string()))),
					}
				}
				_ => {
					if c == '\n' {
						self.line += 1;
					}
					text.push(c);
					self.advance();
				}
			}
		}
		Ok(self.token(Text(text)))
	}

	/// Scan a single token inside a tag.
	fn tag_token(&mut self) -> Result<Token<'a>, LexerError> {
		self.skip_whitespace();
		self.start = self.cursor;
		let next_char = self.advance().ok_or_else(|| self.error(UnterminatedTag))?;
		let tag_name = self.state == LexerState::TagName;
		self.state = LexerState::Tag;

		#[rustfmt::skip]
		let r#type = match next_char {
			'$' => if self.match_next('}') {
				self.state = LexerState::Text;
				TagClose
			} else {
				return Err(self.error(MalformedTagClose));
			},
			'=' if tag_name => EchoMarker,
			'"' => self.string()?,
			'-' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.number()?,
			'+' => Op(Plus),
			'-' => Op(Minus),
			'*' => Op(Star),
			'/' => Op(Slash),
			'@' if self.peek().is_some_and(char::is_alphabetic) => {
				self.identifier();
				Function(&self.source[self.start + 1..self.cursor])
			}
			c if c.is_ascii_digit() => self.number()?,
			c if c.is_alphabetic() => {
				self.identifier();
				let name = &self.source[self.start..self.cursor];
				if tag_name { TokenType::tag_name_or_variable(name) } else { Variable(name) }
			}
			_ => return Err(self.error(UnexpectedCharacter(next_char))),
		};

		Ok(self.token(r#type))
	}

	/// Match the next character if it is the expected one
	fn match_next(&mut self, expected: char) -> bool {
		matches!(self.peek(), Some(c) if c == expected && { self.advance(); true })
	}

	/// Advance to the next character
	fn advance(&mut self) -> Option<char> {
		let (i, c) = self.source_iter.next()?;
		self.cursor = i + c.len_utf8();
		Some(c)
	}

	/// Peek the current character
	fn peek(&mut self) -> Option<char> { self.source_iter.peek().map(|&(_, c)| c) }

	/// Peek the second character ahead
	fn peek_second(&mut self) -> Option<char> {
		let mut it = self.source_iter.clone();
		it.next()?;
		it.peek().map(|&(_, c)| c)
	}

	fn skip_whitespace(&mut self) {
		while let Some(c) = self.peek().filter(|c| c.is_whitespace()) {
			if c == '\n' {
				self.line += 1;
			}
			self.advance();
		}
	}

	/// Scan a string literal, the opening `"` is already consumed
	fn string(&mut self) -> Result<TokenType<'a>, LexerError> {
		let mut value = String::new();
		loop {
			match self.advance() {
				None => return Err(self.error(UnterminatedString)),
				Some('"') => break,
				Some('\\') => match self.advance() {
					Some('\\') => value.push('\\'),
					Some('"') => value.push('"'),
					Some('n') => value.push('\n'),
					Some('r') => value.push('\r'),
					Some('t') => value.push('\t'),
					Some(other) => return Err(self.error(InvalidEscape(format!("\\{other}")))),
					None => return Err(self.error(UnterminatedString)),
				},
				Some(c) => {
					if c == '\n' {
						self.line += 1;
					}
					value.push(c);
				}
			}
		}
		Ok(StringLiteral(value))
	}

	/// Scan a number literal, a sign if any is already consumed
	fn number(&mut self) -> Result<TokenType<'a>, LexerError> {
		while self.peek().is_some_and(|c| c.is_ascii_digit() || c == '.') {
			self.advance();
		}
		if self.exponent_follows() {
			self.advance();
			if self.peek().is_some_and(|c| c == '+' || c == '-') {
				self.advance();
			}
			while self.peek().is_some_and(|c| c.is_ascii_digit()) {
				self.advance();
			}
		}

		let literal = &self.source[self.start..self.cursor];
		let parsed = if literal.contains(['.', 'e', 'E']) {
			literal.parse().map(Double).ok()
		} else {
			literal.parse().map(Integer).ok()
		};
		parsed.ok_or_else(|| self.error(InvalidNumber(literal.to_string())))
	}

	/// `e` or `E` followed by an optionally signed digit
	fn exponent_follows(&self) -> bool {
		let mut it = self.source_iter.clone().map(|(_, c)| c);
		if !matches!(it.next(), Some('e' | 'E')) {
			return false;
		}
		match it.next() {
			Some('+' | '-') => it.next().is_some_and(|c| c.is_ascii_digit()),
			next => next.is_some_and(|c| c.is_ascii_digit()),
		}
	}

	/// Scan the rest of an identifier
	fn identifier(&mut self) {
		while self.peek().is_some_and(|c| c.is_alphanumeric() || c == '_') {
			self.advance();
		}
	}

	fn token(&self, r#type: TokenType<'a>) -> Token<'a> {
		Token::new(r#type, &self.source[self.start..self.cursor], self.line)
	}

	fn error(&self, r#type: LexerErrorType) -> LexerError { LexerError::new(self.line, r#type) }
}
