//! Driver registry and resolution.
//!
//! Maps a caller-supplied [`DriverSpec`] to one ready-to-use driver
//! instance. The registry is an explicit, ordered table passed into
//! resolution rather than ambient global state, so tests substitute a fake
//! table freely. Resolution performs no engine I/O; factories only load and
//! instantiate the driver object, and the actual `open` happens later in the
//! session layer.

use tracing::{debug, warn};

use crate::driver::{Driver, DriverSpec};
use crate::error::{Error, Result};

/// Constructs one driver instance, or reports why it cannot be loaded.
///
/// A factory returning [`Error::DriverUnavailable`] signals an absent
/// optional dependency (no engine binary installed); auto-discovery swallows
/// that and tries the next candidate. Any other error is treated as a broken
/// installation and propagates immediately.
pub type DriverFactory = fn() -> Result<Box<dyn Driver>>;

/// One named entry in the driver table.
pub struct RegistryEntry {
	/// Registry name, matched case-insensitively.
	pub name: &'static str,
	/// Factory producing the driver.
	pub factory: DriverFactory,
}

/// Ordered table of known drivers.
pub struct Registry {
	entries: Vec<RegistryEntry>,
}

impl Registry {
	/// The built-in driver table. Ordered so auto-discovery has a defined
	/// preference; currently the subprocess shell driver is the only entry,
	/// and future variants (native binding, network transport) append here
	/// without changing any call site.
	pub fn builtin() -> Self {
		Registry {
			entries: vec![RegistryEntry {
				name: "shell",
				factory: crate::shell::shell_driver_factory,
			}],
		}
	}

	/// A registry over an explicit entry list, for tests and embedders.
	pub fn with_entries(entries: Vec<RegistryEntry>) -> Self {
		Registry { entries }
	}

	/// Names in the table, in discovery order.
	pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
		self.entries.iter().map(|e| e.name)
	}

	/// Resolve `spec` to one instantiated driver.
	pub fn resolve(&self, spec: DriverSpec) -> Result<Box<dyn Driver>> {
		match spec {
			DriverSpec::Instance(driver) => Ok(driver),
			DriverSpec::Named(name) => self.resolve_named(&name),
			DriverSpec::Auto => self.discover(),
		}
	}

	fn resolve_named(&self, name: &str) -> Result<Box<dyn Driver>> {
		let entry = self
			.entries
			.iter()
			.find(|e| e.name.eq_ignore_ascii_case(name))
			.ok_or_else(|| Error::DriverNotFound(name.to_string()))?;
		debug!(target: "oct", driver = entry.name, "loading named driver");
		(entry.factory)()
	}

	/// Try each entry in order; the first that loads wins. A factory
	/// reporting itself unavailable is skipped; a factory failing any other
	/// way indicates a corrupt installation and aborts discovery.
	fn discover(&self) -> Result<Box<dyn Driver>> {
		for entry in &self.entries {
			match (entry.factory)() {
				Ok(driver) => {
					debug!(target: "oct", driver = entry.name, "auto-discovery selected driver");
					return Ok(driver);
				}
				Err(err) if err.is_unavailable() => {
					warn!(target: "oct", driver = entry.name, %err, "driver unavailable, trying next candidate");
				}
				Err(err) => return Err(err),
			}
		}

		Err(Error::NoDriverAvailable {
			tried: self.names().collect::<Vec<_>>().join(", "),
		})
	}
}
