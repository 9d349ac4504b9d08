//! The call-marshalling plan.
//!
//! Maps a dynamic invocation `f(a, b, c)` to the engine text it takes:
//! one temporary variable name per argument, the call expression over those
//! names, and the statement clearing them afterwards. Kept pure so the
//! mapping is testable without any driver in the loop.
//!
//! Temp names are deterministic in the called function's name and the
//! argument's ordinal, which keeps distinct calls on one handle from
//! colliding as long as function names or ordinals differ. Two simultaneous
//! calls to the *same* function on a shared handle would reuse names — the
//! session layer serializes per-handle access precisely so that cannot
//! happen, and a future concurrent-handle feature must revisit this scheme
//! rather than rely on it.

use oct_runtime::{Error, Result, is_valid_identifier};

/// The engine's implicit last-result slot, updated after every evaluated
/// expression and read back as the call's return value.
pub(crate) const RESULT_SLOT: &str = "ans";

/// Everything a single dispatch needs, computed up front.
#[derive(Debug)]
pub(crate) struct CallPlan {
	function: String,
	temp_names: Vec<String>,
}

impl CallPlan {
	/// Plan a call of `function` with `argc` arguments.
	///
	/// # Errors
	///
	/// [`Error::Usage`] if `function` is not a valid engine identifier;
	/// anything else would let a call name smuggle statement text into the
	/// synthesized expression.
	pub fn new(function: &str, argc: usize) -> Result<CallPlan> {
		if !is_valid_identifier(function) {
			return Err(Error::Usage(format!(
				"'{function}' is not a valid engine function name"
			)));
		}
		Ok(CallPlan {
			function: function.to_string(),
			temp_names: (0..argc).map(|i| temp_name(function, i)).collect(),
		})
	}

	/// Temp variable names, in argument order.
	pub fn temp_names(&self) -> &[String] {
		&self.temp_names
	}

	/// The call expression over the temp names: `f(tmp0, tmp1)`.
	pub fn call_expr(&self) -> String {
		format!("{}({})", self.function, self.temp_names.join(", "))
	}

	/// The statement clearing every temp this plan created, or `None` for a
	/// zero-argument call that created nothing to clear.
	pub fn clear_expr(&self) -> Option<String> {
		if self.temp_names.is_empty() {
			None
		} else {
			Some(format!("clear {}", self.temp_names.join(" ")))
		}
	}
}

fn temp_name(function: &str, index: usize) -> String {
	format!("oct_tmp_{function}_{index}")
}
