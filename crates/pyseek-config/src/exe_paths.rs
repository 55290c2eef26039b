//! Interpreter executable naming and lookup
//!
//! Registry entries always describe Windows installations, so the executable
//! filename used to complete an install directory is `python.exe` on every
//! host. Lookup on `PATH` uses the host's own naming.

use std::path::{Path, PathBuf};

/// Primary executable of a registered CPython-style installation
pub const PYTHON_EXE_NAME: &str = "python.exe";

/// Candidate names searched on PATH
#[cfg(not(windows))]
const PATH_CANDIDATES: &[&str] = &["python3", "python"];
#[cfg(windows)]
const PATH_CANDIDATES: &[&str] = &["python.exe", "python3.exe"];

/// Join an install directory with [`PYTHON_EXE_NAME`].
///
/// A trailing `\` or `/` on the directory is kept as the separator so that
/// `C:\Py\` becomes `C:\Py\python.exe` regardless of the host platform.
pub fn interpreter_in(install_dir: &str) -> PathBuf {
    if install_dir.ends_with('\\') || install_dir.ends_with('/') {
        PathBuf::from(format!("{}{}", install_dir, PYTHON_EXE_NAME))
    } else {
        Path::new(install_dir).join(PYTHON_EXE_NAME)
    }
}

/// Locate a python interpreter on PATH
pub fn find_python() -> Option<PathBuf> {
    PATH_CANDIDATES
        .iter()
        .find_map(|candidate| which::which(candidate).ok())
}
