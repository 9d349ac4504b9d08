//! Host-side representation of engine workspace values.
//!
//! The engine is double-everything: numeric scalars and matrices are IEEE
//! doubles, logicals are 0/1, and character data is a row vector of chars.
//! This enum mirrors that model; how a `Value` is rendered into engine text
//! (and parsed back) is entirely the concern of the driver carrying it.

use serde::{Deserialize, Serialize};

/// A value crossing the host/engine boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
	/// The empty matrix `[]`.
	Empty,
	/// A logical scalar.
	Bool(bool),
	/// A numeric scalar.
	Num(f64),
	/// A character row vector.
	Str(String),
	/// A two-dimensional numeric matrix, stored row-major. Rows must be of
	/// equal length; drivers reject ragged input as a conversion error.
	Matrix(Vec<Vec<f64>>),
}

impl Value {
	/// Returns the numeric scalar, if this is one.
	pub fn as_num(&self) -> Option<f64> {
		match self {
			Value::Num(n) => Some(*n),
			Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
			_ => None,
		}
	}

	/// Returns the string contents, if this is character data.
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Value::Str(s) => Some(s),
			_ => None,
		}
	}

	/// Matrix dimensions as (rows, cols); `Empty` is (0, 0).
	pub fn shape(&self) -> Option<(usize, usize)> {
		match self {
			Value::Empty => Some((0, 0)),
			Value::Matrix(rows) => {
				let cols = rows.first().map_or(0, Vec::len);
				Some((rows.len(), cols))
			}
			_ => None,
		}
	}
}

impl From<f64> for Value {
	fn from(n: f64) -> Self {
		Value::Num(n)
	}
}

impl From<i32> for Value {
	fn from(n: i32) -> Self {
		Value::Num(f64::from(n))
	}
}

impl From<bool> for Value {
	fn from(b: bool) -> Self {
		Value::Bool(b)
	}
}

impl From<&str> for Value {
	fn from(s: &str) -> Self {
		Value::Str(s.to_string())
	}
}

impl From<String> for Value {
	fn from(s: String) -> Self {
		Value::Str(s)
	}
}

impl From<Vec<Vec<f64>>> for Value {
	fn from(rows: Vec<Vec<f64>>) -> Self {
		if rows.is_empty() {
			Value::Empty
		} else {
			Value::Matrix(rows)
		}
	}
}

/// Returns true if `name` is a syntactically valid engine identifier:
/// a letter or underscore followed by letters, digits, or underscores.
///
/// Every variable or function name headed for the engine passes through this
/// check before any I/O happens, so synthesized expressions can never smuggle
/// statement text through a name position.
pub fn is_valid_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	match chars.next() {
		Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
		_ => return false,
	}
	chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
