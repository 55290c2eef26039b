//! Packaging collaborators used around interpreter discovery
//!
//! - [`ensure_empty_dir`] resets an output directory
//! - [`build_package`] produces a source distribution, either through an
//!   isolated PEP 517 build or the legacy `setup.py sdist` path

#![deny(clippy::print_stdout)]

mod build;
mod errors;
mod fs_utils;

pub use build::{
    build_package, BuildArtifact, BuildConfig, BuildKind, BuildSession, CommandRunner,
    SystemRunner,
};
pub use errors::BuildError;
pub use fs_utils::ensure_empty_dir;
