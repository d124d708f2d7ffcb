//! Builds the document tree out of the token stream.
//!
//! The grammar is small enough to be parsed in one pass without lookahead:
//!
//! ``` BNF
//! document → ( TEXT | echo | for )* EOF ;
//! echo     → "{$" "=" element* "$}" ;
//! for      → "{$" "FOR" VARIABLE argument argument argument? "$}" document-part "{$" "END" "$}" ;
//! element  → VARIABLE | FUNCTION | OPERATOR | STRING | INTEGER | DOUBLE ;
//! argument → VARIABLE | STRING | INTEGER | DOUBLE ;
//! ```
//!
//! Open loops are kept on a stack of frames; `END` closes the innermost one.

mod node;

pub use node::{Element, Node};
use TokenType::*;

use crate::{error::parser::{ParseError, ParseErrorType::{self, *}, ParserError}, lexer::{Lexer, Token, TokenType}};

/// Parse a whole template into its document tree.
pub fn parse(source: &str) -> Result<Node, ParserError> { Parser::new(source).parse() }

/// A `FOR` tag waiting for its `END`.
struct LoopHeader {
	variable: String,
	start:    Element,
	end:      Element,
	step:     Element,
}

/// A node that can still receive children.
struct Frame {
	/// `None` for the document itself.
	header:   Option<LoopHeader>,
	children: Vec<Node>,
}

/// Parser pulls tokens from the lexer and assembles the tree.
pub struct Parser<'a> {
	lexer:  Lexer<'a>,
	frames: Vec<Frame>,
	/// Line of the last token read
	line:   usize,
}

impl<'a> Parser<'a> {
	pub fn new(source: &'a str) -> Self {
		Self { lexer: Lexer::new(source), frames: vec![Frame { header: None, children: Vec::new() }], line: 1 }
	}

	pub fn parse(mut self) -> Result<Node, ParserError> {
		loop {
			let token = self.advance()?;
			match token.r#type {
				Text(literal) => self.push_node(Node::Text { literal }),
				TagOpen => self.tag()?,
				Eof => break,
				_ => return Err(self.error(UnknownTag(token.lexeme.to_string()))),
			}
		}

		let frame = self.frames.pop().ok_or_else(|| self.error(UnexpectedEnd))?;
		match frame.header {
			None => Ok(Node::Document { children: frame.children }),
			Some(header) => Err(self.error(UnclosedFor(header.variable))),
		}
	}

	/// Parse a tag, the `{$` is already consumed.
	fn tag(&mut self) -> Result<(), ParserError> {
		let name = self.advance()?;
		match name.r#type {
			EchoMarker => self.echo(),
			ForMarker => self.for_loop(),
			EndMarker => self.end(),
			_ => Err(self.error(UnknownTag(name.lexeme.to_string()))),
		}
	}

	fn echo(&mut self) -> Result<(), ParserError> {
		let mut elements = Vec::new();
		loop {
			let token = self.advance()?;
			if token.r#type == TagClose {
				break;
			}
			let element = Self::element(token).map_err(|lexeme| {
				self.error(MalformedEcho(format!("'{lexeme}' is not a variable, function, operator or constant")))
			})?;
			elements.push(element);
		}
		self.push_node(Node::Echo { elements });
		Ok(())
	}

	fn for_loop(&mut self) -> Result<(), ParserError> {
		let token = self.advance()?;
		let Variable(variable) = token.r#type else {
			return Err(self.error(MalformedFor(format!("expected loop variable, found '{}'", token.lexeme))));
		};

		let mut arguments = Vec::new();
		loop {
			let token = self.advance()?;
			match token.r#type {
				TagClose => break,
				Function(_) | Op(_) => {
					return Err(self.error(MalformedFor(format!("'{}' can't be a loop bound", token.lexeme))));
				}
				_ => {
					let element = Self::element(token).map_err(|lexeme| {
						self.error(MalformedFor(format!("'{lexeme}' can't be a loop bound")))
					})?;
					arguments.push(element);
				}
			}
		}

		let count = arguments.len();
		let mut arguments = arguments.into_iter();
		let (Some(start), Some(end), step, None) = (arguments.next(), arguments.next(), arguments.next(), arguments.next())
		else {
			return Err(self.error(MalformedFor(format!("expected 2 or 3 arguments, found {count}"))));
		};
		let header = LoopHeader { variable: variable.to_string(), start, end, step: step.unwrap_or(Element::Integer(1)) };
		self.frames.push(Frame { header: Some(header), children: Vec::new() });
		Ok(())
	}

	fn end(&mut self) -> Result<(), ParserError> {
		let token = self.advance()?;
		if token.r#type != TagClose {
			return Err(self.error(MalformedEnd(token.lexeme.to_string())));
		}
		if self.frames.len() < 2 {
			return Err(self.error(UnexpectedEnd));
		}
		let Some(Frame { header: Some(header), children }) = self.frames.pop() else {
			return Err(self.error(UnexpectedEnd));
		};
		let LoopHeader { variable, start, end, step } = header;
		self.push_node(Node::ForLoop { variable, start, end, step, children });
		Ok(())
	}

	/// Convert a token into an element, handing back the lexeme if it is none.
	fn element(token: Token<'a>) -> Result<Element, &'a str> {
		Ok(match token.r#type {
			Variable(name) => Element::Variable(name.to_string()),
			Function(name) => Element::Function(name.to_string()),
			Op(operator) => Element::Operator(operator),
			StringLiteral(s) => Element::StringLiteral(s),
			Integer(n) => Element::Integer(n),
			Double(n) => Element::Double(n),
			_ => return Err(token.lexeme),
		})
	}

	fn push_node(&mut self, node: Node) {
		if let Some(frame) = self.frames.last_mut() {
			frame.children.push(node);
		}
	}

	/// Advance to the next token.
	fn advance(&mut self) -> Result<Token<'a>, ParserError> {
		let token = self.lexer.next_token()?;
		self.line = token.line;
		Ok(token)
	}

	fn error(&self, r#type: ParseErrorType) -> ParserError { ParseError::new(self.line, r#type).into() }
}
