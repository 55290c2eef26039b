use clap::{Parser, Subcommand};
use pyseek::{
    commands::{
        build::{self, BuildCommand},
        clean,
        config::{self, ConfigAction},
        list::{self, ListCommand},
    },
    config_manager, logger, GlobalOpts,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pyseek")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(
    about = "Python interpreter discovery",
    long_about = "pyseek finds Python interpreters registered in the Windows registry (PEP 514) and builds source distributions with them."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOpts,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered interpreters
    List(ListCommand),
    /// Configure pyseek
    #[command(subcommand_required = false, arg_required_else_help = false)]
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
    /// Empty a directory, creating it if needed
    Clean {
        dir: PathBuf,
    },
    /// Build a source distribution
    Build(BuildCommand),
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logger::verbosity_to_filter()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logger::init_with_verbosity(cli.global.verbosity_level(), cli.global.no_stdout)
    {
        eprintln!("Warning: Failed to initialize logger: {}", e);
    }
    init_tracing();

    let config = match config_manager::Config::load() {
        Ok(config) => config,
        Err(e) => {
            logger::warn(&format!("Failed to load config, using defaults: {}", e));
            config_manager::Config::default()
        }
    };

    let result = match cli.command {
        Commands::List(cmd) => list::list_interpreters(&cmd, &config),
        Commands::Config { action } => config::handle_config(action, &cli.global),
        Commands::Clean { dir } => clean::clean_dir(&dir),
        Commands::Build(cmd) => build::build(&cmd, &config),
    };

    if let Err(e) = result {
        logger::error(&format!("{:#}", e));
        if cli.global.verbosity_level() == 0 {
            logger::show_log_path();
        }
        std::process::exit(1);
    }
}
