//! Error types for the engine runtime.

use thiserror::Error;

/// Result type alias for runtime operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the engine.
#[derive(Debug, Error)]
pub enum Error {
	/// No driver is registered under the requested name.
	#[error("no engine driver registered under name '{0}'")]
	DriverNotFound(String),

	/// Auto-discovery exhausted the built-in driver list.
	#[error("no usable engine driver available (tried: {tried})")]
	NoDriverAvailable {
		/// Comma-separated names of the candidates that were tried.
		tried: String,
	},

	/// A driver implementation could not be loaded (missing engine binary,
	/// absent optional dependency). Auto-discovery swallows this variant and
	/// moves on to the next candidate; every other error propagates.
	#[error("engine driver '{name}' unavailable: {reason}")]
	DriverUnavailable {
		/// Registry name of the driver.
		name: String,
		/// Why the driver could not be loaded.
		reason: String,
	},

	/// The driver failed to open a session with the engine.
	#[error("failed to reach engine: {0}")]
	EngineUnreachable(String),

	/// The engine rejected or errored on an evaluated expression. Carries the
	/// engine's diagnostic text verbatim.
	#[error("engine error: {0}")]
	Evaluation(String),

	/// A value could not cross the host/engine boundary in either direction.
	#[error("value conversion failed: {0}")]
	Conversion(String),

	/// Read of a variable that is not defined in the engine workspace.
	#[error("undefined engine variable '{0}'")]
	VariableNotFound(String),

	/// Closing the session failed (best-effort).
	#[error("failed to close engine session: {0}")]
	Close(String),

	/// Operation invoked outside the session's `Open` state, or with
	/// arguments that would corrupt the engine workspace (invalid identifier).
	#[error("invalid session use: {0}")]
	Usage(String),

	/// Transport-level failure on the pipe to the engine process.
	#[error("transport error: {0}")]
	Transport(String),

	/// I/O error.
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl Error {
	/// Returns true for the one swallow-and-continue case in driver
	/// auto-discovery.
	pub fn is_unavailable(&self) -> bool {
		matches!(self, Error::DriverUnavailable { .. })
	}

	/// Returns true if the error originated from the engine rejecting an
	/// expression.
	pub fn is_evaluation(&self) -> bool {
		matches!(self, Error::Evaluation(_))
	}
}
