use std::{cmp::Ordering, fmt::Display};

use ValueWrapper::*;

use crate::error::interpreter::ValueError;

/// A dynamically typed value living on the echo stack or in a loop variable.
///
/// Arithmetic coerces both operands to numbers and stores the result as an
/// integer only if both operands were integer typed. Integer pairs are
/// computed exactly and fall back to `f64` on overflow, everything else is
/// computed in `f64`. `Null` counts as integer `0`, strings are typed by their
/// text.
#[derive(Debug, Clone, PartialEq)]
pub enum ValueWrapper {
	Null,
	Integer(i64),
	Double(f64),
	Str(String),
}

/// A value after numeric coercion
#[derive(Debug, Clone, Copy)]
enum Number {
	Integer(i64),
	Double(f64),
}

impl Number {
	fn as_f64(self) -> f64 {
		match self {
			Number::Integer(n) => n as f64,
			Number::Double(n) => n,
		}
	}

	fn is_integer(self) -> bool { matches!(self, Number::Integer(_)) }
}

impl Display for ValueWrapper {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Null => write!(f, "null"),
			Integer(n) => write!(f, "{n}"),
			Double(n) => {
				if n.is_finite() && n.fract() == 0.0 && n.abs() < 1e16 {
					write!(f, "{n:.1}")
				} else {
					write!(f, "{n}")
				}
			}
			Str(s) => write!(f, "{s}"),
		}
	}
}

impl ValueWrapper {
	/// Add `other` to this value.
	pub fn increment(&mut self, other: &Self) -> Result<(), ValueError> {
		self.apply(other, i64::checked_add, |l, r| l + r)
	}

	/// Subtract `other` from this value.
	pub fn decrement(&mut self, other: &Self) -> Result<(), ValueError> {
		self.apply(other, i64::checked_sub, |l, r| l - r)
	}

	pub fn multiply(&mut self, other: &Self) -> Result<(), ValueError> {
		self.apply(other, i64::checked_mul, |l, r| l * r)
	}

	/// Divide this value by `other`; an integer result is truncated toward zero.
	pub fn divide(&mut self, other: &Self) -> Result<(), ValueError> {
		if other.number()?.as_f64() == 0.0 {
			return Err(ValueError::DivisionByZero);
		}
		self.apply(other, i64::checked_div, |l, r| l / r)
	}

	/// Compare numerically without changing either value.
	pub fn num_compare(&self, other: &Self) -> Result<Ordering, ValueError> {
		Ok(match (self.number()?, other.number()?) {
			(Number::Integer(left), Number::Integer(right)) => left.cmp(&right),
			(left, right) => left.as_f64().total_cmp(&right.as_f64()),
		})
	}

	/// The value as `f64`, for functions that work on doubles only.
	pub fn to_f64(&self) -> Result<f64, ValueError> { Ok(self.number()?.as_f64()) }

	fn apply(
		&mut self,
		other: &Self,
		exact: impl Fn(i64, i64) -> Option<i64>,
		operation: impl Fn(f64, f64) -> f64,
	) -> Result<(), ValueError> {
		let (left, right) = (self.number()?, other.number()?);
		let exact_result = match (left, right) {
			(Number::Integer(l), Number::Integer(r)) => exact(l, r),
			_ => None,
		};
		if let Some(result) = exact_result {
			*self = Integer(result);
			return Ok(());
		}
		let result = operation(left.as_f64(), right.as_f64());
		*self = if left.is_integer() && right.is_integer() { Integer(result as i64) } else { Double(result) };
		Ok(())
	}

	fn number(&self) -> Result<Number, ValueError> {
		match self {
			Null => Ok(Number::Integer(0)),
			Integer(n) => Ok(Number::Integer(*n)),
			Double(n) => Ok(Number::Double(*n)),
			Str(s) => {
				let parsed = if s.contains(['.', 'e', 'E']) {
					s.parse().ok().map(Number::Double)
				} else {
					s.parse().ok().map(Number::Integer)
				};
				parsed.ok_or_else(|| ValueError::NotANumber(s.clone()))
			}
		}
	}
}

impl From<i64> for ValueWrapper {
	fn from(value: i64) -> Self { Integer(value) }
}

impl From<f64> for ValueWrapper {
	fn from(value: f64) -> Self { Double(value) }
}

impl From<String> for ValueWrapper {
	fn from(value: String) -> Self { Str(value) }
}

impl From<&str> for ValueWrapper {
	fn from(value: &str) -> Self { Str(value.to_string()) }
}

#[cfg(test)]
mod tests {
	use super::*;

	fn sum(left: ValueWrapper, right: ValueWrapper) -> ValueWrapper {
		let mut value = left;
		value.increment(&right).unwrap();
		value
	}

	#[test]
	fn integer_operands_stay_integer() {
		assert_eq!(sum(Integer(2), Integer(3)), Integer(5));
		assert_eq!(sum(Null, Integer(3)), Integer(3));
		assert_eq!(sum(Null, Null), Integer(0));
		assert_eq!(sum(Str("4".into()), Integer(1)), Integer(5));

		let mut value = Integer(7);
		value.divide(&Integer(2)).unwrap();
		assert_eq!(value, Integer(3));

		let mut value = Integer(-7);
		value.multiply(&Integer(3)).unwrap();
		value.decrement(&Integer(1)).unwrap();
		assert_eq!(value, Integer(-22));
	}

	#[test]
	fn large_integers_are_exact() {
		let mut value = Integer(1 << 53);
		value.increment(&Integer(1)).unwrap();
		assert_eq!(value, Integer((1 << 53) + 1));
		assert_eq!(value.num_compare(&Integer(1 << 53)), Ok(Ordering::Greater));

		let mut value = Integer(i64::MAX);
		value.increment(&Integer(1)).unwrap();
		assert_eq!(value, Integer(i64::MAX));
	}

	#[test]
	fn any_double_operand_makes_double() {
		assert_eq!(sum(Integer(2), Double(0.5)), Double(2.5));
		assert_eq!(sum(Double(1.0), Integer(1)), Double(2.0));
		assert_eq!(sum(Str("1.5".into()), Null), Double(1.5));
		assert_eq!(sum(Str("1E2".into()), Integer(1)), Double(101.0));

		let mut value = Integer(7);
		value.divide(&Double(2.0)).unwrap();
		assert_eq!(value, Double(3.5));
	}

	#[test]
	fn division_by_zero_fails() {
		for zero in [Integer(0), Double(0.0), Null, Str("0".into()), Str("0.0".into())] {
			let mut value = Integer(1);
			assert_eq!(value.divide(&zero), Err(ValueError::DivisionByZero));
			assert_eq!(value, Integer(1));
		}
	}

	#[test]
	fn non_numeric_strings_fail() {
		let mut value = Str("abc".into());
		assert_eq!(value.increment(&Integer(1)), Err(ValueError::NotANumber("abc".to_string())));
		assert!(Integer(1).num_compare(&Str("".into())).is_err());
		assert!(Integer(1).num_compare(&Str("NaN".into())).is_err());
	}

	#[test]
	fn compare_does_not_mutate() {
		let left = Integer(3);
		assert_eq!(left.num_compare(&Double(3.5)), Ok(Ordering::Less));
		assert_eq!(left.num_compare(&Str("3".into())), Ok(Ordering::Equal));
		assert_eq!(left.num_compare(&Null), Ok(Ordering::Greater));
		assert_eq!(left, Integer(3));
	}

	#[test]
	fn display_values() {
		assert_eq!(Integer(-4).to_string(), "-4");
		assert_eq!(Double(2.0).to_string(), "2.0");
		assert_eq!(Double(0.25).to_string(), "0.25");
		assert_eq!(Str("text".into()).to_string(), "text");
		assert_eq!(Null.to_string(), "null");
	}
}
