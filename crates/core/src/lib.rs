//! oct: Rust sessions for Octave-style numeric engines
//!
//! Exposes a live external numeric-computation engine to Rust callers:
//! variable I/O, raw expression evaluation, and a dynamic call protocol that
//! marshals `session.call("f", args)` into the remote variable writes, the
//! evaluation, the result read, and the cleanup it takes — leaving the
//! engine workspace exactly as it was, plus the result.
//!
//! Which transport carries the five primitive operations is a driver
//! concern: the built-in `"shell"` driver runs a real interpreter over
//! stdio pipes, and the registry accepts any [`Driver`] implementation.
//!
//! # Examples
//!
//! ```ignore
//! use oct::{LaunchConfig, Session, Value};
//!
//! fn main() -> oct::Result<()> {
//!     // Scoped form: the session closes on every exit path.
//!     Session::with("shell", &LaunchConfig::default(), |engine| {
//!         engine.set_variable("x", 123.456)?;
//!         engine.set_variable("y", 789.101112)?;
//!         engine.eval("z = x * y")?;
//!         let z = engine.get_variable("z")?;
//!         println!("z = {z:?}");
//!
//!         // Dynamic dispatch: marshalled into engine-side temporaries,
//!         // one evaluation, and a read of the implicit result slot.
//!         let root = engine.call("sqrt", &[Value::Num(16.0)])?;
//!         assert_eq!(root.as_num(), Some(4.0));
//!         Ok(())
//!     })
//! }
//! ```

mod dispatch;
mod session;

pub use session::Session;

// Re-export the runtime surface callers need alongside Session
pub use oct_runtime::{
	Driver, DriverSpec, Error, Handle, LaunchConfig, Registry, RegistryEntry, Result, Value,
};

// Re-export oct-runtime for embedders writing their own drivers
pub use oct_runtime;
