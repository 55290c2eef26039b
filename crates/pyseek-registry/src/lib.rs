//! PEP 514 interpreter discovery
//!
//! Walks the `Software\Python` keys of the current-user and local-machine
//! hives (both word-size views of the latter), and turns every vendor tag
//! that names a usable interpreter into an [`InterpreterRecord`].
//!
//! ```no_run
//! use pyseek_registry::{discover_interpreters, TracingSink};
//!
//! for record in discover_interpreters(&TracingSink) {
//!     println!("{record}");
//! }
//! ```
//!
//! Registry access goes through the [`RegistryStore`] / [`RegistryKey`]
//! traits; [`MemoryRegistry`] implements them without touching the host.

#![deny(clippy::print_stdout)]

pub mod dedupe;
pub mod diagnostics;
pub mod memory;
pub mod record;
pub mod resolve;
pub mod roots;
pub mod scanner;
pub mod store;
#[cfg(windows)]
pub mod windows;

pub use dedupe::dedupe_by_executable;
pub use diagnostics::{CollectingSink, Diagnostic, DiagnosticSink, NullSink, TracingSink};
pub use memory::{MemoryRegistry, MemoryRegistryError};
pub use record::InterpreterRecord;
pub use roots::{DiscoveryRoot, Hive, RegistryView, DISCOVERY_ROOTS};
pub use scanner::{discover_interpreters, scan, scan_roots, Scan};
pub use store::{RegValue, RegistryKey, RegistryStore, StoreError};
