//! Engine sessions.
//!
//! A [`Session`] is the sole owner of one engine handle and the single
//! entry point for all engine interaction: variable I/O, raw expression
//! evaluation, and the dynamic call protocol. Teardown is deterministic:
//! `close` releases the handle exactly once, the scoped form
//! ([`Session::with`]) guarantees release on every exit path, and `Drop`
//! backstops callers that forget.
//!
//! Every operation blocks until the driver's transport answers; the engine
//! is an interactive, one-command-at-a-time shell. A session may be shared
//! across threads — an internal mutex serializes all access to the handle,
//! which the call protocol requires because it reads the engine's single
//! implicit result slot. Independent sessions run fully concurrently.

use oct_runtime::{Driver, DriverSpec, Handle, LaunchConfig, Registry, Value};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::dispatch::{CallPlan, RESULT_SLOT};
use crate::{Error, Result};

struct Inner {
	driver: Box<dyn Driver>,
	/// `Some` while the session is open; taken exactly once by close.
	handle: Option<Handle>,
}

impl Inner {
	fn handle(&self) -> Result<&Handle> {
		self.handle
			.as_ref()
			.ok_or_else(|| Error::Usage("session is closed".to_string()))
	}

	fn eval(&mut self, expr: &str) -> Result<()> {
		let handle = self
			.handle
			.as_ref()
			.ok_or_else(|| Error::Usage("session is closed".to_string()))?;
		self.driver.eval_string(handle, expr)
	}

	fn put(&mut self, name: &str, value: &Value) -> Result<()> {
		let handle = self
			.handle
			.as_ref()
			.ok_or_else(|| Error::Usage("session is closed".to_string()))?;
		self.driver.put_variable(handle, name, value)
	}

	fn get(&mut self, name: &str) -> Result<Value> {
		let handle = self
			.handle
			.as_ref()
			.ok_or_else(|| Error::Usage("session is closed".to_string()))?;
		self.driver.get_variable(handle, name)
	}
}

/// A live connection to the engine.
pub struct Session {
	inner: Mutex<Inner>,
}

impl std::fmt::Debug for Session {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Session").finish_non_exhaustive()
	}
}

impl Session {
	/// Open a session using the built-in driver table.
	///
	/// `driver` selects the transport: a prebuilt [`Driver`] instance, a
	/// registry name (case-insensitive), or [`DriverSpec::Auto`] to take the
	/// first built-in driver that loads.
	///
	/// # Errors
	///
	/// Resolution failures ([`Error::DriverNotFound`],
	/// [`Error::NoDriverAvailable`]) and open failures
	/// ([`Error::EngineUnreachable`]) abort construction; no partial session
	/// is ever returned.
	pub fn open(driver: impl Into<DriverSpec>, launch: &LaunchConfig) -> Result<Session> {
		Session::open_with_registry(&Registry::builtin(), driver, launch)
	}

	/// Open a session resolving the driver through an explicit registry.
	pub fn open_with_registry(
		registry: &Registry,
		driver: impl Into<DriverSpec>,
		launch: &LaunchConfig,
	) -> Result<Session> {
		let spec = driver.into();
		debug!(target: "oct", ?spec, "resolving engine driver");
		let mut driver = registry.resolve(spec)?;
		let handle = driver.open(launch)?;
		debug!(target: "oct", handle = handle.id(), "session open");
		Ok(Session {
			inner: Mutex::new(Inner {
				driver,
				handle: Some(handle),
			}),
		})
	}

	/// Scoped form: open, hand the live session to `body`, and close exactly
	/// once when `body` returns — normally or with an error.
	///
	/// This is the recommended usage pattern: the handle is released on every
	/// exit path without relying on `Drop` timing.
	pub fn with<T>(
		driver: impl Into<DriverSpec>,
		launch: &LaunchConfig,
		body: impl FnOnce(&Session) -> Result<T>,
	) -> Result<T> {
		let session = Session::open(driver, launch)?;
		let outcome = body(&session);
		let closed = session.close();
		match outcome {
			Ok(value) => closed.map(|()| value),
			Err(err) => {
				// The body's error is the interesting one; a close failure
				// on top of it is logged, not returned.
				if let Err(close_err) = closed {
					warn!(target: "oct", %close_err, "close failed after scoped body error");
				}
				Err(err)
			}
		}
	}

	/// Whether the session still holds its handle.
	pub fn is_open(&self) -> bool {
		self.inner.lock().handle.is_some()
	}

	/// Evaluate expression text in the engine, verbatim. No parsing, no
	/// result capture — a purely side-effecting primitive.
	///
	/// # Errors
	///
	/// [`Error::Evaluation`] with the engine's diagnostic if the expression
	/// is rejected; [`Error::Usage`] on a closed session.
	pub fn eval(&self, expr: &str) -> Result<()> {
		self.inner.lock().eval(expr)
	}

	/// Write `value` into the engine workspace under `name`.
	pub fn set_variable(&self, name: &str, value: impl Into<Value>) -> Result<()> {
		require_identifier(name)?;
		self.inner.lock().put(name, &value.into())
	}

	/// Read the engine variable `name`.
	///
	/// # Errors
	///
	/// [`Error::VariableNotFound`] if undefined, [`Error::Conversion`] if
	/// the value cannot be represented host-side.
	pub fn get_variable(&self, name: &str) -> Result<Value> {
		require_identifier(name)?;
		self.inner.lock().get(name)
	}

	/// Invoke the remote function `function` with `args`.
	///
	/// The dispatch runs as a fixed, strictly sequential sequence on the
	/// handle: one temporary variable put per argument in argument order,
	/// one evaluation of `function(temps...)`, one read of the engine's
	/// implicit result slot, and one clear of every temporary. The clear
	/// runs even when an earlier step failed, so the engine workspace after
	/// the call equals its state before it — plus the result slot, which
	/// the engine itself mutates on every evaluation.
	pub fn call(&self, function: &str, args: &[Value]) -> Result<Value> {
		let plan = CallPlan::new(function, args.len())?;
		let mut inner = self.inner.lock();
		inner.handle()?;
		debug!(target: "oct", function, argc = args.len(), "dispatching remote call");

		let outcome = run_dispatch(&mut inner, &plan, args);

		if let Some(clear) = plan.clear_expr() {
			if let Err(cleanup_err) = inner.eval(&clear) {
				return match outcome {
					// The call itself succeeded but its temporaries are now
					// leaked in the engine workspace; that is worth failing.
					Ok(_) => Err(cleanup_err),
					// Never let cleanup failure hide the original error.
					Err(original) => {
						warn!(target: "oct", %cleanup_err, "failed to clear temporaries after dispatch error");
						Err(original)
					}
				};
			}
		}

		outcome
	}

	/// Release the engine handle. Idempotent: closing an already-closed
	/// session is a no-op, while every other operation on it fails with
	/// [`Error::Usage`].
	pub fn close(&self) -> Result<()> {
		let mut inner = self.inner.lock();
		match inner.handle.take() {
			Some(handle) => {
				debug!(target: "oct", handle = handle.id(), "session closing");
				inner.driver.close(handle)
			}
			None => Ok(()),
		}
	}
}

impl Drop for Session {
	fn drop(&mut self) {
		let inner = self.inner.get_mut();
		if let Some(handle) = inner.handle.take() {
			if let Err(err) = inner.driver.close(handle) {
				warn!(target: "oct", %err, "best-effort close on drop failed");
			}
		}
	}
}

/// Steps 1-3 of the dispatch protocol; the caller owns step 4 (cleanup) so
/// it runs on this function's error paths too.
fn run_dispatch(inner: &mut Inner, plan: &CallPlan, args: &[Value]) -> Result<Value> {
	for (name, value) in plan.temp_names().iter().zip(args) {
		inner.put(name, value)?;
	}
	inner.eval(&plan.call_expr())?;
	inner.get(RESULT_SLOT)
}

fn require_identifier(name: &str) -> Result<()> {
	if oct_runtime::is_valid_identifier(name) {
		Ok(())
	} else {
		Err(Error::Usage(format!(
			"'{name}' is not a valid engine variable name"
		)))
	}
}
