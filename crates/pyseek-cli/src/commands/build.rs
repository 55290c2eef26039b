use crate::config_manager::{exe_paths, Config};
use crate::logger;
use anyhow::{anyhow, Result};
use clap::Args;
use pyseek_package::{build_package, BuildConfig, BuildSession, SystemRunner};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct BuildCommand {
    /// Project directory containing pyproject.toml or setup.py
    #[arg(long, default_value = ".")]
    pub dir: PathBuf,
    /// Output directory, emptied before the build (default: config `dist-dir` or `dist`)
    #[arg(long)]
    pub dist_dir: Option<PathBuf>,
    /// Isolated PEP 517 build with `python -m build`
    #[arg(long, conflicts_with = "legacy")]
    pub isolated: bool,
    /// Legacy `python setup.py sdist` build
    #[arg(long)]
    pub legacy: bool,
    /// Interpreter to build with (default: config `python`, then PATH)
    #[arg(long)]
    pub python: Option<PathBuf>,
}

impl BuildCommand {
    /// Merge command line flags over the configured defaults
    pub fn build_config(&self, config: &Config) -> BuildConfig {
        let isolated_build = if self.legacy {
            false
        } else if self.isolated {
            true
        } else {
            config.isolated_build()
        };
        BuildConfig {
            setup_dir: self.dir.clone(),
            dist_dir: self.dist_dir.clone().unwrap_or_else(|| config.dist_dir()),
            isolated_build,
        }
    }

    fn interpreter(&self, config: &Config) -> Result<PathBuf> {
        self.python
            .clone()
            .or_else(|| config.python.as_deref().map(PathBuf::from))
            .or_else(exe_paths::find_python)
            .ok_or_else(|| anyhow!("No Python interpreter found; pass --python or set `python`"))
    }
}

pub fn build(cmd: &BuildCommand, config: &Config) -> Result<()> {
    let build_config = cmd.build_config(config);
    let python = cmd.interpreter(config)?;
    logger::debug(&format!("building with {}", python.display()));

    let runner = SystemRunner;
    let session = BuildSession {
        python,
        runner: &runner,
    };

    logger::spinner_start(&format!("Building {}", build_config.setup_dir.display()));
    match build_package(&build_config, &session) {
        Ok(artifact) => {
            logger::spinner_success(&format!("Built {}", artifact.path.display()));
            Ok(())
        }
        Err(e) => {
            logger::spinner_error("Build failed");
            Err(e.into())
        }
    }
}
