//! Configuration and interpreter path conventions shared by the pyseek crates
//!
//! Kept free of registry and build logic so that `pyseek-registry`,
//! `pyseek-package` and the CLI can all depend on it without cycles.

#![deny(clippy::print_stdout)]

mod config;
mod errors;
pub mod exe_paths;

pub use config::{Config, CONFIG_KEYS};
pub use errors::ConfigError;
