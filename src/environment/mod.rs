//! Variable store of a single script execution.
//!
//! Every name maps to its own stack of values. A loop pushes a frame for its
//! variable when it starts and pops it when it ends, so a nested loop reusing
//! the outer loop's name shadows it only while it runs.

use std::collections::HashMap;

use crate::interpreter::value::ValueWrapper;

/// Maps variable names to stacks of values
#[derive(Default, Debug)]
pub struct Multistack {
	stacks: HashMap<String, Vec<ValueWrapper>>,
}

impl Multistack {
	pub fn new() -> Self { Self::default() }

	pub fn push(&mut self, name: &str, value: ValueWrapper) {
		self.stacks.entry(name.to_string()).or_default().push(value);
	}

	/// Remove the top frame for `name`; the name disappears with its last frame.
	pub fn pop(&mut self, name: &str) -> Option<ValueWrapper> {
		let stack = self.stacks.get_mut(name)?;
		let value = stack.pop();
		if stack.is_empty() {
			self.stacks.remove(name);
		}
		value
	}

	pub fn peek(&self, name: &str) -> Option<&ValueWrapper> { self.stacks.get(name)?.last() }

	pub fn peek_mut(&mut self, name: &str) -> Option<&mut ValueWrapper> { self.stacks.get_mut(name)?.last_mut() }

	pub fn is_empty(&self, name: &str) -> bool { self.peek(name).is_none() }
}
