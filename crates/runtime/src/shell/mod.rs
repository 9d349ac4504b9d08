//! Subprocess shell driver.
//!
//! Drives a real Octave interpreter over stdin/stdout pipes. Each open
//! handle is one interpreter process with its own workspace; the driver can
//! hold several at once and routes every operation by handle id.

mod codec;
mod process;
mod transport;

use std::collections::HashMap;
use std::io::BufReader;
use std::process::{ChildStdin, ChildStdout};

use tracing::debug;

use crate::driver::{Driver, Handle, LaunchConfig};
use crate::error::{Error, Result};
use crate::value::Value;

pub use process::locate_executable;

/// Factory registered under the name `"shell"`.
///
/// Loading only checks that an engine binary can be located — no engine I/O
/// happens until `open`. A missing binary is reported as the swallowable
/// [`Error::DriverUnavailable`] so auto-discovery can move on.
pub fn shell_driver_factory() -> Result<Box<dyn Driver>> {
	locate_executable()?;
	Ok(Box::new(ShellDriver::new()))
}

struct ShellSession {
	process: process::EngineProcess,
	transport: transport::PipeTransport<ChildStdin, BufReader<ChildStdout>>,
}

/// Driver implementation over interpreter subprocesses.
pub struct ShellDriver {
	sessions: HashMap<u64, ShellSession>,
	next_id: u64,
}

impl ShellDriver {
	pub fn new() -> Self {
		ShellDriver {
			sessions: HashMap::new(),
			next_id: 1,
		}
	}

	fn session(&mut self, handle: &Handle) -> Result<&mut ShellSession> {
		self.sessions
			.get_mut(&handle.id())
			.ok_or_else(|| Error::Usage("stale engine handle".to_string()))
	}
}

impl Default for ShellDriver {
	fn default() -> Self {
		ShellDriver::new()
	}
}

impl Driver for ShellDriver {
	fn open(&mut self, launch: &LaunchConfig) -> Result<Handle> {
		let (process, stdin, stdout) = process::EngineProcess::spawn(launch)?;
		let mut session = ShellSession {
			process,
			transport: transport::PipeTransport::new(stdin, BufReader::new(stdout)),
		};

		// Probe the interpreter before handing out a handle; a process that
		// spawned but cannot answer is an unreachable engine, not a live one.
		match session.transport.roundtrip(codec::PING) {
			Ok(payload) if payload.iter().any(|line| line == "ready:") => {}
			Ok(payload) => {
				let _ = session.process.shutdown();
				return Err(Error::EngineUnreachable(format!(
					"unexpected engine probe answer: {payload:?}"
				)));
			}
			Err(err) => {
				let _ = session.process.shutdown();
				return Err(Error::EngineUnreachable(format!(
					"engine did not answer the session probe: {err}"
				)));
			}
		}

		let id = self.next_id;
		self.next_id += 1;
		self.sessions.insert(id, session);
		debug!(target: "oct", handle = id, "shell session open");
		Ok(Handle::new(id))
	}

	fn eval_string(&mut self, handle: &Handle, expr: &str) -> Result<()> {
		// Output of a bare expression is irrelevant here; eval is a purely
		// side-effecting primitive.
		self.session(handle)?.transport.roundtrip(expr)?;
		Ok(())
	}

	fn put_variable(&mut self, handle: &Handle, name: &str, value: &Value) -> Result<()> {
		let statement = codec::render_assignment(name, value)?;
		self.session(handle)?.transport.roundtrip(&statement)?;
		Ok(())
	}

	fn get_variable(&mut self, handle: &Handle, name: &str) -> Result<Value> {
		let request = codec::dump_request(name);
		let payload = self.session(handle)?.transport.roundtrip(&request)?;
		codec::parse_dump(name, &payload)
	}

	fn close(&mut self, handle: Handle) -> Result<()> {
		let session = self
			.sessions
			.remove(&handle.id())
			.ok_or_else(|| Error::Usage("stale engine handle".to_string()))?;
		debug!(target: "oct", handle = handle.id(), "shell session closing");
		// Dropping the transport closes the interpreter's stdin, so a
		// well-behaved process exits on EOF before shutdown reaps it.
		drop(session.transport);
		session.process.shutdown()
	}
}
