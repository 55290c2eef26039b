//! pyseek library - expose modules for testing
//!
//! The binary in `main.rs` is a thin dispatcher over [`commands`].

pub mod commands;
pub mod common;
pub mod sink;

pub use common::GlobalOpts;
pub use pyseek_config as config_manager;
pub use pyseek_logger as logger;
