//! Synchronous request/response transport over the interpreter's stdio.
//!
//! The engine is an interactive, one-command-at-a-time shell, so the
//! transport is strictly blocking: write one request block, read lines until
//! the end-of-response sentinel, return the payload. Every request is
//! wrapped in an engine-side `try`/`catch` so evaluation failures come back
//! in-band as an error sentinel instead of landing on stderr, where a pipe
//! reader could not attribute them to a request.

use std::io::{BufRead, Write};

use tracing::trace;

use crate::error::{Error, Result};

/// Printed by the engine after every request, success or failure.
const DONE_MARKER: &str = "<<oct:done>>";

/// Prefixes the engine's diagnostic when the wrapped code raised.
const ERROR_MARKER: &str = "<<oct:error>>";

/// Wrap raw engine code so it always terminates the response with
/// [`DONE_MARKER`] and reports failures via [`ERROR_MARKER`].
fn frame_request(code: &str) -> String {
	format!(
		"try\n{code}\ncatch __oct_frame_err__\nprintf(\"\\n{ERROR_MARKER}%s\\n\", \
		 strrep(__oct_frame_err__.message, \"\\n\", \" \"));\nend_try_catch\n\
		 printf(\"\\n{DONE_MARKER}\\n\");\nfflush(stdout);\n"
	)
}

/// Blocking line transport over a writer/reader pipe pair.
///
/// Generic over the pipe ends so tests can run it against in-memory buffers
/// instead of a live child process.
pub struct PipeTransport<W: Write, R: BufRead> {
	tx: W,
	rx: R,
}

impl<W: Write, R: BufRead> PipeTransport<W, R> {
	pub fn new(tx: W, rx: R) -> Self {
		PipeTransport { tx, rx }
	}

	/// Send `code` and collect the response payload lines.
	///
	/// # Errors
	///
	/// [`Error::Evaluation`] with the engine's diagnostic if the code raised;
	/// [`Error::Transport`] if the pipe closes before the response completes.
	pub fn roundtrip(&mut self, code: &str) -> Result<Vec<String>> {
		trace!(target: "oct", bytes = code.len(), "sending request block");
		self.tx.write_all(frame_request(code).as_bytes())?;
		self.tx.flush()?;
		self.read_response()
	}

	fn read_response(&mut self) -> Result<Vec<String>> {
		let mut payload = Vec::new();
		let mut diagnostic: Option<String> = None;

		loop {
			let mut line = String::new();
			let n = self.rx.read_line(&mut line)?;
			if n == 0 {
				return Err(Error::Transport(
					"engine closed the pipe mid-response".to_string(),
				));
			}

			let line = line.trim_end_matches(['\n', '\r']);
			if line == DONE_MARKER {
				break;
			}
			if let Some(message) = line.strip_prefix(ERROR_MARKER) {
				diagnostic = Some(message.to_string());
				continue;
			}
			if !line.is_empty() {
				payload.push(line.to_string());
			}
		}

		match diagnostic {
			Some(message) => Err(Error::Evaluation(message)),
			None => Ok(payload),
		}
	}
}
