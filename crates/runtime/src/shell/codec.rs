//! Text codec between host [`Value`]s and the interpreter's line protocol.
//!
//! Outbound, values are rendered as engine literals inside an assignment
//! statement. Inbound, [`dump_request`] sends engine code that prints the
//! variable as tagged lines (`num:`, `bool:`, `str:`, `mat:` with row
//! lines, `undef:`, `unsupported:`), which [`parse_dump`] reads back. The
//! dump logic is inlined into every request — plain statements survive the
//! transport's `try` wrapper on any interpreter, where a function
//! definition would not. Character data crosses the boundary
//! base64-encoded in both directions so embedded newlines can never break
//! the line framing.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::error::{Error, Result};
use crate::value::Value;

/// Cheap liveness probe sent once at `open`; the response proves the
/// interpreter is parsing and answering before any caller traffic.
pub const PING: &str = "printf(\"ready:\\n\");";

/// The statement `put_variable` sends: `name = <literal>;`.
pub fn render_assignment(name: &str, value: &Value) -> Result<String> {
	Ok(format!("{name} = {};", render_literal(value)?))
}

/// The request `get_variable` sends: print the variable in tagged-line
/// form, or tag it undefined.
pub fn dump_request(name: &str) -> String {
	format!(
		r#"if !exist("{name}", "var")
  printf("undef:\n");
elseif ischar({name})
  printf("str:%s\n", base64_encode(uint8({name})));
elseif islogical({name}) && isscalar({name})
  printf("bool:%d\n", {name});
elseif isnumeric({name}) && isscalar({name})
  printf("num:%.17g\n", double({name}));
elseif isnumeric({name}) && ndims({name}) == 2 && isempty({name})
  printf("empty:\n");
elseif isnumeric({name}) && ndims({name}) == 2
  [__oct_r__, __oct_c__] = size({name});
  printf("mat:%d:%d\n", __oct_r__, __oct_c__);
  for __oct_i__ = 1:__oct_r__
    printf("row:");
    printf(" %.17g", {name}(__oct_i__,:));
    printf("\n");
  endfor
  clear __oct_r__ __oct_c__ __oct_i__
else
  printf("unsupported:%s\n", class({name}));
endif"#
	)
}

fn render_literal(value: &Value) -> Result<String> {
	match value {
		Value::Empty => Ok("[]".to_string()),
		Value::Bool(true) => Ok("true".to_string()),
		Value::Bool(false) => Ok("false".to_string()),
		Value::Num(n) => Ok(render_f64(*n)),
		Value::Str(s) => Ok(if s.is_empty() {
			"\"\"".to_string()
		} else {
			format!("char(base64_decode(\"{}\"))", BASE64.encode(s.as_bytes()))
		}),
		Value::Matrix(rows) => render_matrix(rows),
	}
}

fn render_f64(n: f64) -> String {
	if n.is_nan() {
		"NaN".to_string()
	} else if n == f64::INFINITY {
		"Inf".to_string()
	} else if n == f64::NEG_INFINITY {
		"-Inf".to_string()
	} else {
		// Exponent form round-trips every finite double and is always a
		// valid engine literal.
		format!("{n:e}")
	}
}

fn render_matrix(rows: &[Vec<f64>]) -> Result<String> {
	let Some(first) = rows.first() else {
		return Ok("[]".to_string());
	};
	let cols = first.len();
	if cols == 0 || rows.iter().any(|row| row.len() != cols) {
		return Err(Error::Conversion(format!(
			"matrix rows must be non-empty and of equal length (got {:?})",
			rows.iter().map(Vec::len).collect::<Vec<_>>()
		)));
	}

	let body = rows
		.iter()
		.map(|row| {
			row.iter()
				.map(|n| render_f64(*n))
				.collect::<Vec<_>>()
				.join(", ")
		})
		.collect::<Vec<_>>()
		.join("; ");
	Ok(format!("[{body}]"))
}

/// Parse the tagged-line dump of variable `name` back into a [`Value`].
pub fn parse_dump(name: &str, lines: &[String]) -> Result<Value> {
	let mut lines = lines.iter();
	let head = lines
		.next()
		.ok_or_else(|| Error::Conversion(format!("empty dump for '{name}'")))?;

	let (tag, rest) = head
		.split_once(':')
		.ok_or_else(|| Error::Conversion(format!("malformed dump line for '{name}': {head:?}")))?;

	match tag {
		"undef" => Err(Error::VariableNotFound(name.to_string())),
		"unsupported" => Err(Error::Conversion(format!(
			"engine value of class '{rest}' has no host representation"
		))),
		"empty" => Ok(Value::Empty),
		"bool" => Ok(Value::Bool(rest.trim() != "0")),
		"num" => parse_f64(rest).map(Value::Num),
		"str" => {
			let bytes = BASE64
				.decode(rest.trim())
				.map_err(|err| Error::Conversion(format!("bad base64 string dump: {err}")))?;
			String::from_utf8(bytes)
				.map(Value::Str)
				.map_err(|err| Error::Conversion(format!("string dump is not UTF-8: {err}")))
		}
		"mat" => parse_matrix(rest, lines),
		other => Err(Error::Conversion(format!(
			"unknown dump tag '{other}' for '{name}'"
		))),
	}
}

fn parse_f64(text: &str) -> Result<f64> {
	let text = text.trim();
	match text {
		"NaN" | "-NaN" => Ok(f64::NAN),
		"Inf" => Ok(f64::INFINITY),
		"-Inf" => Ok(f64::NEG_INFINITY),
		_ => text
			.parse()
			.map_err(|err| Error::Conversion(format!("bad numeric dump {text:?}: {err}"))),
	}
}

fn parse_matrix<'a>(
	dims: &str,
	lines: impl Iterator<Item = &'a String>,
) -> Result<Value> {
	let (r, c) = dims
		.split_once(':')
		.ok_or_else(|| Error::Conversion(format!("malformed matrix dims {dims:?}")))?;
	let rows_expected: usize = r
		.parse()
		.map_err(|_| Error::Conversion(format!("bad matrix row count {r:?}")))?;
	let cols_expected: usize = c
		.parse()
		.map_err(|_| Error::Conversion(format!("bad matrix column count {c:?}")))?;

	let mut rows = Vec::with_capacity(rows_expected);
	for line in lines {
		let Some(entries) = line.strip_prefix("row:") else {
			return Err(Error::Conversion(format!(
				"expected matrix row line, got {line:?}"
			)));
		};
		let row = entries
			.split_whitespace()
			.map(parse_f64)
			.collect::<Result<Vec<f64>>>()?;
		if row.len() != cols_expected {
			return Err(Error::Conversion(format!(
				"matrix row has {} entries, expected {cols_expected}",
				row.len()
			)));
		}
		rows.push(row);
	}

	if rows.len() != rows_expected {
		return Err(Error::Conversion(format!(
			"matrix dump has {} rows, expected {rows_expected}",
			rows.len()
		)));
	}
	Ok(Value::Matrix(rows))
}
