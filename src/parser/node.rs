//! Document tree nodes.
//!
//! A parsed template is a [`Node::Document`] whose children are text runs, echo
//! tags and loops; loops nest further children. The tree holds data only and
//! is never modified once built, so one tree can be executed any number of
//! times.

use crate::lexer::Operator;

/// A node of the document tree
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
	/// The root of every parsed template.
	Document { children: Vec<Node> },
	/// Literal text, written out verbatim.
	Text { literal: String },
	/// `{$= ... $}`, evaluates its elements and writes what's left.
	Echo { elements: Vec<Element> },
	/// `{$FOR variable start end [step] $} ... {$END$}`.
	ForLoop { variable: String, start: Element, end: Element, step: Element, children: Vec<Node> },
}

/// The parts of echo expressions and loop bounds
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
	Variable(String),
	/// Name of a built-in function, without the `@`.
	Function(String),
	Operator(Operator),
	StringLiteral(String),
	Integer(i64),
	Double(f64),
}

impl Node {
	pub fn children(&self) -> &[Node] {
		match self {
			Node::Document { children } | Node::ForLoop { children, .. } => children,
			Node::Text { .. } | Node::Echo { .. } => &[],
		}
	}
}

/// Regenerates template source that parses back into an equal tree.
impl std::fmt::Display for Node {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Node::Document { children } => children.iter().try_for_each(|child| write!(f, "{child}")),
			Node::Text { literal } => write!(f, "{}", literal.replace('\\', r"\\").replace('{', r"\{")),
			Node::Echo { elements } => {
				write!(f, "{{$=")?;
				elements.iter().try_for_each(|element| write!(f, " {element}"))?;
				write!(f, " $}}")
			}
			Node::ForLoop { variable, start, end, step, children } => {
				write!(f, "{{$ FOR {variable} {start} {end} {step} $}}")?;
				children.iter().try_for_each(|child| write!(f, "{child}"))?;
				write!(f, "{{$END$}}")
			}
		}
	}
}

impl std::fmt::Display for Element {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Element::Variable(name) => write!(f, "{name}"),
			Element::Function(name) => write!(f, "@{name}"),
			Element::Operator(operator) => write!(f, "{operator}"),
			Element::StringLiteral(s) => {
				let escaped = s
					.replace('\\', r"\\")
					.replace('"', "\\\"")
					.replace('\n', r"\n")
					.replace('\r', r"\r")
					.replace('\t', r"\t");
				write!(f, "\"{escaped}\"")
			}
			Element::Integer(n) => write!(f, "{n}"),
			Element::Double(n) => {
				if n.is_finite() && n.fract() == 0.0 {
					write!(f, "{n:.1}")
				} else {
					write!(f, "{n}")
				}
			}
		}
	}
}
