use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building a source distribution
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No {expected} found in {dir}")]
    MissingProjectFile { dir: PathBuf, expected: String },

    #[error("`{command}` exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    #[error("Build finished but produced nothing in {0}")]
    NoArtifact(PathBuf),
}
