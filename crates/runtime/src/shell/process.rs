//! Engine process management for the shell driver.
//!
//! Handles locating the Octave executable and managing the lifecycle of the
//! interpreter process the driver talks to over stdio pipes.

use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::debug;

use crate::driver::LaunchConfig;
use crate::error::{Error, Result};

/// Locate the Octave executable.
///
/// Search order:
/// 1. `OCT_RS_EXECUTABLE` environment variable (runtime override)
/// 2. `OCTAVE_EXECUTABLE` environment variable (shared with other tooling)
/// 3. `octave-cli` then `octave` on PATH
/// 4. Common install locations
///
/// # Errors
///
/// Returns [`Error::DriverUnavailable`] if no candidate exists — the
/// swallowable case during driver auto-discovery, since a missing engine
/// binary is an absent optional dependency, not a broken installation.
pub fn locate_executable() -> Result<PathBuf> {
	for var in ["OCT_RS_EXECUTABLE", "OCTAVE_EXECUTABLE"] {
		if let Ok(path) = std::env::var(var) {
			let path = PathBuf::from(path);
			if path.exists() {
				debug!(target: "oct", %var, path = %path.display(), "using engine executable from environment");
				return Ok(path);
			}
		}
	}

	for name in ["octave-cli", "octave"] {
		if let Some(path) = find_on_path(name) {
			return Ok(path);
		}
	}

	#[cfg(not(windows))]
	let common_locations = [
		"/usr/local/bin/octave-cli",
		"/usr/local/bin/octave",
		"/usr/bin/octave-cli",
		"/usr/bin/octave",
		"/opt/homebrew/bin/octave",
	];

	#[cfg(windows)]
	let common_locations = [
		"C:\\Program Files\\GNU Octave\\octave-cli.exe",
		"C:\\Program Files (x86)\\GNU Octave\\octave-cli.exe",
	];

	for location in &common_locations {
		let path = PathBuf::from(location);
		if path.exists() {
			return Ok(path);
		}
	}

	Err(Error::DriverUnavailable {
		name: "shell".to_string(),
		reason: "Octave executable not found. Install GNU Octave or set OCT_RS_EXECUTABLE."
			.to_string(),
	})
}

fn find_on_path(name: &str) -> Option<PathBuf> {
	#[cfg(not(windows))]
	let which_cmd = "which";
	#[cfg(windows)]
	let which_cmd = "where";

	let output = Command::new(which_cmd).arg(name).output().ok()?;
	if !output.status.success() {
		return None;
	}
	let stdout = String::from_utf8_lossy(&output.stdout);
	let first = stdout.lines().next()?.trim();
	if first.is_empty() {
		return None;
	}
	let path = PathBuf::from(first);
	path.exists().then_some(path)
}

/// Arguments that put the interpreter into a pipe-friendly mode: no GUI, no
/// startup files, no history, no prompt decoration.
fn interpreter_args() -> &'static [&'static str] {
	&["--no-gui", "--norc", "--no-history", "--silent"]
}

/// One engine interpreter child process.
#[derive(Debug)]
pub struct EngineProcess {
	child: Child,
}

impl EngineProcess {
	/// Spawn the interpreter with piped stdin/stdout and return the process
	/// together with both pipe ends.
	///
	/// # Errors
	///
	/// Returns [`Error::EngineUnreachable`] if the executable cannot be
	/// located, fails to spawn, or exits immediately.
	pub fn spawn(launch: &LaunchConfig) -> Result<(EngineProcess, ChildStdin, ChildStdout)> {
		let executable = match &launch.command {
			Some(command) => PathBuf::from(command),
			None => locate_executable()
				.map_err(|err| Error::EngineUnreachable(err.to_string()))?,
		};

		debug!(target: "oct", executable = %executable.display(), "launching engine process");

		let mut child = Command::new(&executable)
			.args(interpreter_args())
			.args(&launch.args)
			.stdin(Stdio::piped())
			.stdout(Stdio::piped())
			.stderr(Stdio::null())
			.spawn()
			.map_err(|err| {
				Error::EngineUnreachable(format!(
					"failed to spawn {}: {err}",
					executable.display()
				))
			})?;

		// Catch a launch that dies straight away (bad flags, unrunnable
		// binary) instead of reporting it as a transport failure later.
		std::thread::sleep(std::time::Duration::from_millis(50));
		if let Some(early_exit) = check_early_exit(&mut child, &executable)? {
			return Err(early_exit);
		}

		let stdin = child
			.stdin
			.take()
			.ok_or_else(|| Error::EngineUnreachable("engine stdin pipe missing".to_string()))?;
		let stdout = child
			.stdout
			.take()
			.ok_or_else(|| Error::EngineUnreachable("engine stdout pipe missing".to_string()))?;

		Ok((EngineProcess { child }, stdin, stdout))
	}

	/// Terminate the interpreter. The transport's stdin end should already be
	/// dropped by the caller so a well-behaved interpreter has seen EOF.
	pub fn shutdown(mut self) -> Result<()> {
		match self.child.try_wait() {
			Ok(Some(_)) => return Ok(()),
			Ok(None) => {}
			Err(err) => {
				return Err(Error::Close(format!("failed to check engine process: {err}")));
			}
		}

		self.child
			.kill()
			.map_err(|err| Error::Close(format!("failed to kill engine process: {err}")))?;
		let _ = self.child.wait();
		Ok(())
	}
}

fn check_early_exit(child: &mut Child, executable: &Path) -> Result<Option<Error>> {
	match child.try_wait() {
		Ok(Some(status)) => Ok(Some(Error::EngineUnreachable(format!(
			"{} exited immediately with {status}",
			executable.display()
		)))),
		Ok(None) => Ok(None),
		Err(err) => Err(Error::EngineUnreachable(format!(
			"failed to check engine process: {err}"
		))),
	}
}
