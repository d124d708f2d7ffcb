use crate::error::context::ContextError;

#[derive(thiserror::Error, Debug)]
/// Errors that can occur during interpretation
pub enum InterpreterError {
	/// A variable read outside of any loop that defines it
	#[error("Undefined variable '{0}'")]
	UndefinedVariable(String),
	/// A `@function` that isn't registered
	#[error("Unknown function '@{0}'")]
	UnknownFunction(String),
	/// An operator or function needed more values than the stack holds
	#[error("Stack underflow in {0}")]
	StackUnderflow(String),
	/// A function or operator where a loop bound was expected
	#[error("'{0}' is not a value")]
	NotAValue(String),
	/// A loop step that would never reach the end bound
	#[error("Loop over '{0}' needs a positive step, got {1}")]
	InvalidStep(String, String),
	/// Adding the step no longer changes the loop variable
	#[error("Loop over '{0}' stalled at {1}")]
	StalledLoop(String, String),
	/// Invalid arithmetic, see [`ValueError`]
	#[error("Invalid arithmetic: {0}")]
	ArithmeticError(#[from] ValueError),
	/// A `@decfmt` pattern that can't be applied
	#[error("Invalid format pattern '{0}'")]
	FormatError(String),
	/// The request context refused a write or a metadata change
	#[error(transparent)]
	ContextError(#[from] ContextError),
}

/// Errors raised by numeric operations on wrapped values.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ValueError {
	#[error("division by zero")]
	DivisionByZero,
	#[error("'{0}' is not a number")]
	NotANumber(String),
}
