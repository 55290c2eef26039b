//! Source distribution builds

use crate::errors::BuildError;
use crate::fs_utils::ensure_empty_dir;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::SystemTime;

/// Runs external commands on behalf of a build
pub trait CommandRunner {
    fn run(&self, program: &Path, args: &[OsString], cwd: &Path) -> io::Result<Output>;
}

/// Runs commands as child processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &Path, args: &[OsString], cwd: &Path) -> io::Result<Output> {
        Command::new(program).args(args).current_dir(cwd).output()
    }
}

/// What to build and where to put it
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Project root containing `pyproject.toml` and/or `setup.py`
    pub setup_dir: PathBuf,
    /// Emptied before the build; receives the sdist
    pub dist_dir: PathBuf,
    /// PEP 517 isolated build instead of `setup.py sdist`
    pub isolated_build: bool,
}

/// The interpreter and process runner a build executes with
pub struct BuildSession<'a> {
    pub python: PathBuf,
    pub runner: &'a dyn CommandRunner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildKind {
    Isolated,
    Legacy,
}

/// The file a build produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    pub path: PathBuf,
    pub kind: BuildKind,
}

/// Build a source distribution of `config.setup_dir`
pub fn build_package(
    config: &BuildConfig,
    session: &BuildSession<'_>,
) -> Result<BuildArtifact, BuildError> {
    if config.isolated_build {
        build_isolated(config, session)
    } else {
        make_sdist(config, session)
    }
}

fn absolute(path: &Path) -> io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}

fn build_isolated(
    config: &BuildConfig,
    session: &BuildSession<'_>,
) -> Result<BuildArtifact, BuildError> {
    let has_project = ["pyproject.toml", "setup.py"]
        .iter()
        .any(|f| config.setup_dir.join(f).is_file());
    if !has_project {
        return Err(BuildError::MissingProjectFile {
            dir: config.setup_dir.clone(),
            expected: "pyproject.toml or setup.py".to_string(),
        });
    }

    let dist_dir = absolute(&config.dist_dir)?;
    let setup_dir = absolute(&config.setup_dir)?;
    ensure_empty_dir(&dist_dir)?;

    tracing::debug!("isolated sdist build of {}", setup_dir.display());
    let args: Vec<OsString> = vec![
        "-m".into(),
        "build".into(),
        "--sdist".into(),
        "--outdir".into(),
        dist_dir.clone().into_os_string(),
        setup_dir.clone().into_os_string(),
    ];
    run_checked(session, &args, &setup_dir)?;
    newest_artifact(&dist_dir, BuildKind::Isolated)
}

fn make_sdist(
    config: &BuildConfig,
    session: &BuildSession<'_>,
) -> Result<BuildArtifact, BuildError> {
    if !config.setup_dir.join("setup.py").is_file() {
        return Err(BuildError::MissingProjectFile {
            dir: config.setup_dir.clone(),
            expected: "setup.py".to_string(),
        });
    }

    let dist_dir = absolute(&config.dist_dir)?;
    let setup_dir = absolute(&config.setup_dir)?;
    ensure_empty_dir(&dist_dir)?;

    tracing::debug!("legacy sdist build of {}", setup_dir.display());
    let args: Vec<OsString> = vec![
        "setup.py".into(),
        "sdist".into(),
        "--formats=zip".into(),
        "--dist-dir".into(),
        dist_dir.clone().into_os_string(),
    ];
    run_checked(session, &args, &setup_dir)?;
    newest_artifact(&dist_dir, BuildKind::Legacy)
}

fn run_checked(
    session: &BuildSession<'_>,
    args: &[OsString],
    cwd: &Path,
) -> Result<(), BuildError> {
    let command = std::iter::once(session.python.as_os_str())
        .chain(args.iter().map(OsString::as_os_str))
        .map(|s| s.to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ");
    tracing::debug!("running {}", command);

    let output = session.runner.run(&session.python, args, cwd)?;
    pyseek_logger::capture_output(&command, &output);
    if !output.status.success() {
        return Err(BuildError::CommandFailed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

fn newest_artifact(dist_dir: &Path, kind: BuildKind) -> Result<BuildArtifact, BuildError> {
    let newest = fs::read_dir(dist_dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .max_by_key(|path| {
            fs::metadata(path)
                .and_then(|m| m.modified())
                .unwrap_or(SystemTime::UNIX_EPOCH)
        })
        .ok_or_else(|| BuildError::NoArtifact(dist_dir.to_path_buf()))?;
    tracing::debug!("built {}", newest.display());
    Ok(BuildArtifact { path: newest, kind })
}
