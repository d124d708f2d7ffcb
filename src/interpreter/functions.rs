//! Built-in functions callable from echo tags as `@name`.
//!
//! Functions take their arguments from the echo stack, the last argument on
//! top, and push their results back. `paramGet(name default)` therefore pops
//! the default first and the name second.

use ValueWrapper::*;

use crate::{context::RequestContext, error::interpreter::InterpreterError, interpreter::value::ValueWrapper};

type NativeFunction = fn(&mut Vec<ValueWrapper>, &mut RequestContext<'_>) -> Result<(), InterpreterError>;

fn lookup(name: &str) -> Option<NativeFunction> {
	let function: NativeFunction = match name {
		"sin" => sin,
		"cos" => cos,
		"decfmt" => decfmt,
		"dup" => dup,
		"swap" => swap,
		"setMimeType" => set_mime_type,
		"paramGet" => param_get,
		"pparamGet" => pparam_get,
		"pparamSet" => pparam_set,
		"pparamDel" => pparam_del,
		"tparamGet" => tparam_get,
		"tparamSet" => tparam_set,
		"tparamDel" => tparam_del,
		_ => return None,
	};
	Some(function)
}

/// Call the built-in `name` on the echo stack.
pub(crate) fn call(
	name: &str,
	stack: &mut Vec<ValueWrapper>,
	context: &mut RequestContext<'_>,
) -> Result<(), InterpreterError> {
	let function = lookup(name).ok_or_else(|| InterpreterError::UnknownFunction(name.to_string()))?;
	function(stack, context)
}

fn pop(stack: &mut Vec<ValueWrapper>, function: &str) -> Result<ValueWrapper, InterpreterError> {
	stack.pop().ok_or_else(|| InterpreterError::StackUnderflow(format!("@{function}")))
}

/// Sine of an angle in degrees.
fn sin(stack: &mut Vec<ValueWrapper>, _: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let angle = pop(stack, "sin")?.to_f64()?;
	stack.push(Double(angle.to_radians().sin()));
	Ok(())
}

/// Cosine of an angle in degrees.
fn cos(stack: &mut Vec<ValueWrapper>, _: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let angle = pop(stack, "cos")?.to_f64()?;
	stack.push(Double(angle.to_radians().cos()));
	Ok(())
}

fn decfmt(stack: &mut Vec<ValueWrapper>, _: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let pattern = pop(stack, "decfmt")?.to_string();
	let value = pop(stack, "decfmt")?.to_f64()?;
	stack.push(Str(format_decimal(value, &pattern)?));
	Ok(())
}

fn dup(stack: &mut Vec<ValueWrapper>, _: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let top = stack.last().cloned().ok_or_else(|| InterpreterError::StackUnderflow("@dup".to_string()))?;
	stack.push(top);
	Ok(())
}

fn swap(stack: &mut Vec<ValueWrapper>, _: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let a = pop(stack, "swap")?;
	let b = pop(stack, "swap")?;
	stack.push(a);
	stack.push(b);
	Ok(())
}

fn set_mime_type(stack: &mut Vec<ValueWrapper>, context: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let mime_type = pop(stack, "setMimeType")?.to_string();
	context.set_mime_type(mime_type)?;
	Ok(())
}

fn param_get(stack: &mut Vec<ValueWrapper>, context: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let default = pop(stack, "paramGet")?;
	let name = pop(stack, "paramGet")?.to_string();
	stack.push(context.parameter(&name).map(ValueWrapper::from).unwrap_or(default));
	Ok(())
}

fn pparam_get(stack: &mut Vec<ValueWrapper>, context: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let default = pop(stack, "pparamGet")?;
	let name = pop(stack, "pparamGet")?.to_string();
	stack.push(context.persistent_parameter(&name).map(ValueWrapper::from).unwrap_or(default));
	Ok(())
}

fn pparam_set(stack: &mut Vec<ValueWrapper>, context: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let name = pop(stack, "pparamSet")?.to_string();
	let value = pop(stack, "pparamSet")?.to_string();
	context.set_persistent_parameter(name, value);
	Ok(())
}

fn pparam_del(stack: &mut Vec<ValueWrapper>, context: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let name = pop(stack, "pparamDel")?.to_string();
	context.remove_persistent_parameter(&name);
	Ok(())
}

fn tparam_get(stack: &mut Vec<ValueWrapper>, context: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let default = pop(stack, "tparamGet")?;
	let name = pop(stack, "tparamGet")?.to_string();
	stack.push(context.temporary_parameter(&name).map(ValueWrapper::from).unwrap_or(default));
	Ok(())
}

fn tparam_set(stack: &mut Vec<ValueWrapper>, context: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let name = pop(stack, "tparamSet")?.to_string();
	let value = pop(stack, "tparamSet")?.to_string();
	context.set_temporary_parameter(name, value);
	Ok(())
}

fn tparam_del(stack: &mut Vec<ValueWrapper>, context: &mut RequestContext<'_>) -> Result<(), InterpreterError> {
	let name = pop(stack, "tparamDel")?.to_string();
	context.remove_temporary_parameter(&name);
	Ok(())
}

/// Format `value` with a decimal pattern made of `0` (mandatory digit) and `#`
/// (optional digit), e.g. `0.000` or `#.##`.
pub(crate) fn format_decimal(value: f64, pattern: &str) -> Result<String, InterpreterError> {
	let invalid = || InterpreterError::FormatError(pattern.to_string());
	let (integer_pattern, fraction_pattern) = pattern.split_once('.').unwrap_or((pattern, ""));
	let is_digits = |part: &str| part.chars().all(|c| c == '0' || c == '#');
	if pattern.is_empty() || !is_digits(integer_pattern) || !is_digits(fraction_pattern) || !value.is_finite() {
		return Err(invalid());
	}

	let min_integer = integer_pattern.matches('0').count();
	let min_fraction = fraction_pattern.matches('0').count();
	let rounded = format!("{:.*}", fraction_pattern.len(), value.abs());
	let (integer_digits, fraction_digits) = rounded.split_once('.').unwrap_or((&rounded, ""));
	let integer_digits = integer_digits.trim_start_matches('0');
	let mut fraction_digits = fraction_digits.to_string();
	while fraction_digits.len() > min_fraction && fraction_digits.ends_with('0') {
		fraction_digits.pop();
	}

	let mut formatted = String::new();
	let is_zero = integer_digits.is_empty() && fraction_digits.chars().all(|c| c == '0');
	if value < 0.0 && !is_zero {
		formatted.push('-');
	}
	formatted.push_str(&"0".repeat(min_integer.saturating_sub(integer_digits.len())));
	formatted.push_str(integer_digits);
	if !fraction_digits.is_empty() {
		formatted.push('.');
		formatted.push_str(&fraction_digits);
	}
	if formatted.is_empty() || formatted == "-" {
		formatted = "0".to_string();
	}
	Ok(formatted)
}
