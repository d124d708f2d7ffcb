//! Template interpreter.
//!
//! The interpreter walks the document tree depth first, writing everything
//! through the [`RequestContext`]:
//!
//! - **Text** is written verbatim.
//! - **Echo** runs its elements on a fresh stack: constants and variables are
//!   pushed, operators pop two values and push the result, functions work on
//!   the stack directly. Whatever is left is written bottom to top.
//! - **ForLoop** pushes a frame for its variable, runs the body while the
//!   variable doesn't exceed the end bound, adding the step after each pass,
//!   and pops the frame again.

pub(crate) mod functions;
pub(crate) mod value;

use std::cmp::Ordering;

use value::ValueWrapper;

use crate::{context::RequestContext, environment::Multistack, error::interpreter::InterpreterError, lexer::Operator, parser::{Element, Node}};

/// Interpreter executes a document tree against one request context.
pub struct Interpreter<'c, 'a> {
	context:    &'c mut RequestContext<'a>,
	multistack: Multistack,
}

impl<'c, 'a> Interpreter<'c, 'a> {
	pub fn new(context: &'c mut RequestContext<'a>) -> Self { Self { context, multistack: Multistack::new() } }

	/// Execute `document`; the first error aborts the execution.
	pub fn execute(&mut self, document: &Node) -> Result<(), InterpreterError> { self.visit(document) }

	fn visit(&mut self, node: &Node) -> Result<(), InterpreterError> {
		match node {
			Node::Document { children } => children.iter().try_for_each(|child| self.visit(child)),
			Node::Text { literal } => Ok(self.context.write_str(literal)?),
			Node::Echo { elements } => self.echo(elements),
			Node::ForLoop { variable, start, end, step, children } => {
				self.for_loop(variable, start, end, step, children)
			}
		}
	}

	fn echo(&mut self, elements: &[Element]) -> Result<(), InterpreterError> {
		let mut stack = Vec::new();
		for element in elements {
			match element {
				Element::Operator(operator) => {
					let right = Self::pop(&mut stack, operator)?;
					let mut left = Self::pop(&mut stack, operator)?;
					match operator {
						Operator::Plus => left.increment(&right)?,
						Operator::Minus => left.decrement(&right)?,
						Operator::Star => left.multiply(&right)?,
						Operator::Slash => left.divide(&right)?,
					}
					stack.push(left);
				}
				Element::Function(name) => functions::call(name, &mut stack, self.context)?,
				_ => stack.push(self.value_of(element)?),
			}
		}

		for value in stack {
			self.context.write_str(&value.to_string())?;
		}
		Ok(())
	}

	fn for_loop(
		&mut self,
		variable: &str,
		start: &Element,
		end: &Element,
		step: &Element,
		children: &[Node],
	) -> Result<(), InterpreterError> {
		let start = self.value_of(start)?;
		let end = self.value_of(end)?;
		let step = self.value_of(step)?;
		if step.num_compare(&ValueWrapper::Integer(0))? != Ordering::Greater {
			return Err(InterpreterError::InvalidStep(variable.to_string(), step.to_string()));
		}

		self.multistack.push(variable, start);
		let result = self.run_loop(variable, &end, &step, children);
		self.multistack.pop(variable);
		result
	}

	fn run_loop(
		&mut self,
		variable: &str,
		end: &ValueWrapper,
		step: &ValueWrapper,
		children: &[Node],
	) -> Result<(), InterpreterError> {
		loop {
			let current = self.variable(variable)?;
			if current.num_compare(end)? == Ordering::Greater {
				return Ok(());
			}
			let previous = current.clone();
			children.iter().try_for_each(|child| self.visit(child))?;
			let current = self
				.multistack
				.peek_mut(variable)
				.ok_or_else(|| InterpreterError::UndefinedVariable(variable.to_string()))?;
			current.increment(step)?;
			if current.num_compare(&previous)? != Ordering::Greater {
				// Only a value already at the bound may stop moving.
				if previous.num_compare(end)? == Ordering::Less {
					return Err(InterpreterError::StalledLoop(variable.to_string(), previous.to_string()));
				}
				return Ok(());
			}
		}
	}

	/// The value of a constant or a variable.
	fn value_of(&self, element: &Element) -> Result<ValueWrapper, InterpreterError> {
		Ok(match element {
			Element::Variable(name) => self.variable(name)?.clone(),
			Element::StringLiteral(s) => ValueWrapper::Str(s.clone()),
			Element::Integer(n) => ValueWrapper::Integer(*n),
			Element::Double(n) => ValueWrapper::Double(*n),
			Element::Function(_) | Element::Operator(_) => {
				return Err(InterpreterError::NotAValue(element.to_string()));
			}
		})
	}

	fn variable(&self, name: &str) -> Result<&ValueWrapper, InterpreterError> {
		self.multistack.peek(name).ok_or_else(|| InterpreterError::UndefinedVariable(name.to_string()))
	}

	fn pop(stack: &mut Vec<ValueWrapper>, operator: &Operator) -> Result<ValueWrapper, InterpreterError> {
		stack.pop().ok_or_else(|| InterpreterError::StackUnderflow(format!("operator '{operator}'")))
	}
}
