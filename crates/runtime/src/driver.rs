//! The driver capability interface.
//!
//! A driver implements the five primitive remote operations against one
//! concrete transport to the engine: an in-process binding, a subprocess
//! shell over pipes, or (future) a network connection. The session layer is
//! polymorphic over this trait and never sees how the operations are carried.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::value::Value;

/// Opaque token identifying one live engine connection.
///
/// Issued by [`Driver::open`] and meaningful only to the driver that issued
/// it. Deliberately neither `Clone` nor `Copy`: the session layer owns its
/// handle exclusively, and [`Driver::close`] consumes it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
	/// Mints a handle. Only drivers create handles; the id namespace is
	/// private to the issuing driver.
	pub fn new(id: u64) -> Self {
		Handle(id)
	}

	/// The driver-private id behind this handle.
	pub fn id(&self) -> u64 {
		self.0
	}
}

/// How to launch or reach the engine.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LaunchConfig {
	/// Explicit engine executable or connection descriptor. When absent the
	/// driver runs its own discovery (environment overrides, PATH, common
	/// install locations).
	pub command: Option<String>,
	/// Extra arguments appended to the driver's own launch arguments.
	pub args: Vec<String>,
}

impl LaunchConfig {
	/// Config with an explicit engine command.
	pub fn with_command(command: impl Into<String>) -> Self {
		LaunchConfig {
			command: Some(command.into()),
			args: Vec::new(),
		}
	}
}

/// The five primitive remote operations.
///
/// Implementations are free to keep several handles alive at once; each
/// handle is an independent engine connection. All operations block until
/// the underlying transport answers — the engine is an interactive,
/// one-command-at-a-time shell, and the session layer serializes access to
/// each handle.
pub trait Driver: Send {
	/// Open a connection to the engine and return its handle.
	///
	/// # Errors
	///
	/// Returns [`Error::EngineUnreachable`](crate::Error::EngineUnreachable)
	/// if the engine cannot be launched or contacted.
	fn open(&mut self, launch: &LaunchConfig) -> Result<Handle>;

	/// Evaluate expression text verbatim. Purely side-effecting: no result
	/// is captured here.
	///
	/// # Errors
	///
	/// Returns [`Error::Evaluation`](crate::Error::Evaluation) carrying the
	/// engine's diagnostic if the expression is rejected.
	fn eval_string(&mut self, handle: &Handle, expr: &str) -> Result<()>;

	/// Write `value` into the engine workspace under `name`. Conversion to
	/// the engine's native representation is this driver's responsibility.
	fn put_variable(&mut self, handle: &Handle, name: &str, value: &Value) -> Result<()>;

	/// Read the variable `name` back from the engine workspace.
	///
	/// # Errors
	///
	/// [`Error::VariableNotFound`](crate::Error::VariableNotFound) if the
	/// name is undefined,
	/// [`Error::Conversion`](crate::Error::Conversion) if its value cannot
	/// be represented host-side.
	fn get_variable(&mut self, handle: &Handle, name: &str) -> Result<Value>;

	/// Release the connection behind `handle`. Consumes the handle; the
	/// driver must tolerate nothing else ever referencing it again.
	fn close(&mut self, handle: Handle) -> Result<()>;
}

impl std::fmt::Debug for dyn Driver {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("<dyn Driver>")
	}
}

/// Caller-supplied driver selector, resolved once at session construction.
pub enum DriverSpec {
	/// Use this already-constructed driver directly.
	Instance(Box<dyn Driver>),
	/// Look the driver up in the registry by name, case-insensitively.
	Named(String),
	/// Auto-discover: take the first built-in driver that loads.
	Auto,
}

impl Default for DriverSpec {
	fn default() -> Self {
		DriverSpec::Auto
	}
}

impl std::fmt::Debug for DriverSpec {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			DriverSpec::Instance(_) => f.write_str("DriverSpec::Instance(..)"),
			DriverSpec::Named(name) => write!(f, "DriverSpec::Named({name:?})"),
			DriverSpec::Auto => f.write_str("DriverSpec::Auto"),
		}
	}
}

impl From<&str> for DriverSpec {
	fn from(name: &str) -> Self {
		DriverSpec::Named(name.to_string())
	}
}

impl From<String> for DriverSpec {
	fn from(name: String) -> Self {
		DriverSpec::Named(name)
	}
}

impl From<Box<dyn Driver>> for DriverSpec {
	fn from(driver: Box<dyn Driver>) -> Self {
		DriverSpec::Instance(driver)
	}
}
