//! oct-runtime - Driver lifecycle, registry, and transport
//!
//! Low-level infrastructure for talking to an Octave-style numeric engine:
//!
//! - **Driver interface**: the five primitive remote operations
//!   (`open`, `eval_string`, `put_variable`, `get_variable`, `close`)
//! - **Registry**: ordered table of named drivers with case-insensitive
//!   lookup and best-effort auto-discovery
//! - **Shell driver**: subprocess transport over stdio pipes to a real
//!   interpreter
//! - **Value model**: host-side representation of engine workspace values
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │   oct-rs    │  Session, dynamic call protocol
//! └──────┬──────┘
//!        │ resolves a Driver through the Registry
//! ┌──────▼──────┐
//! │ oct-runtime │  This crate
//! │  ┌────────┐ │
//! │  │Registry│ │  name → factory resolution
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Driver │ │  capability trait, opaque handles
//! │  └────────┘ │
//! │  ┌────────┐ │
//! │  │ Shell  │ │  interpreter process + pipe transport
//! │  └────────┘ │
//! └─────────────┘
//! ```
//!
//! The registry is passed into resolution explicitly rather than living as
//! ambient global state, so embedders and tests substitute their own driver
//! tables without touching process-wide configuration.

pub mod driver;
pub mod error;
pub mod registry;
pub mod shell;
pub mod value;

// Re-export key types at crate root
pub use driver::{Driver, DriverSpec, Handle, LaunchConfig};
pub use error::{Error, Result};
pub use registry::{DriverFactory, Registry, RegistryEntry};
pub use shell::{ShellDriver, shell_driver_factory};
pub use value::{Value, is_valid_identifier};
