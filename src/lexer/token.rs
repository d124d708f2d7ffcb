/// A token produced by the lexer
#[derive(Debug, Clone, PartialEq)]
pub struct Token<'a> {
	pub r#type: TokenType<'a>,
	pub lexeme: &'a str,
	pub line:   usize,
}

impl<'a> Token<'a> {
	pub fn new(r#type: TokenType<'a>, lexeme: &'a str, line: usize) -> Self { Self { r#type, lexeme, line } }
}

/// The different types of tokens in a template
#[derive(Debug, Clone, PartialEq)]
pub enum TokenType<'a> {
	/// Literal text outside of tags, escapes already resolved.
	Text(String),
	/// Tag opening `{$`.
	TagOpen,
	/// Tag closing `$}`.
	TagClose,
	/// Echo tag name `=`.
	EchoMarker,
	/// Loop tag name `FOR`.
	ForMarker,
	/// Loop terminator tag name `END`.
	EndMarker,
	/// Variable name, e.g. `i` or `counter_2`.
	Variable(&'a str),
	/// Function name without the leading `@`.
	Function(&'a str),
	/// Arithmetic operator.
	Op(Operator),
	/// String literal, escapes already resolved.
	StringLiteral(String),
	/// Integer literal, e.g. `-12`.
	Integer(i64),
	/// Double literal, e.g. `3.14`.
	Double(f64),
	/// End of input.
	Eof,
}

impl<'a> TokenType<'a> {
	/// Tag names are matched case-insensitively, anything else is left for the
	/// parser to reject.
	pub fn tag_name_or_variable(value: &'a str) -> Self {
		if value.eq_ignore_ascii_case("for") {
			TokenType::ForMarker
		} else if value.eq_ignore_ascii_case("end") {
			TokenType::EndMarker
		} else {
			TokenType::Variable(value)
		}
	}
}

/// Binary operators understood inside echo tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
	Plus,
	Minus,
	Star,
	Slash,
}

impl Operator {
	pub fn symbol(&self) -> char {
		match self {
			Operator::Plus => '+',
			Operator::Minus => '-',
			Operator::Star => '*',
			Operator::Slash => '/',
		}
	}
}

impl std::fmt::Display for Operator {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result { write!(f, "{}", self.symbol()) }
}
