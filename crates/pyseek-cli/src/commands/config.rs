use crate::config_manager::{Config, CONFIG_KEYS};
use crate::logger;
use crate::GlobalOpts;
use anyhow::{bail, Context, Result};
use clap::Subcommand;
use colored::*;
use std::fs;

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Print every configured value
    Show,
    /// Print a single value
    Get { key: String },
    Set {
        key: String,
        value: String,
    },
    /// Get or set the path to the config file.
    /// If `new_path` is provided, the CLI will set the config path to that value.
    /// If omitted, the CLI will print the current configuration file path.
    Path {
        /// Optional new config path to set
        new_path: Option<String>,
    },
}

pub fn handle_config(action: Option<ConfigAction>, opts: &GlobalOpts) -> Result<()> {
    match action.unwrap_or(ConfigAction::Show) {
        ConfigAction::Show => {
            let config = Config::load().context("Failed to load config")?;
            println!("{}", "Configuration:".bold().green());
            if config.is_empty() {
                if opts.verbosity_level() > 0 {
                    println!("  {}", "(empty)".yellow());
                }
            } else {
                for (key, value) in config.values_iter() {
                    println!("  {}: {}", key.cyan(), value);
                }
            }
        }
        ConfigAction::Get { key } => {
            if !CONFIG_KEYS.contains(&key.as_str()) {
                bail!(unknown_key(&key));
            }
            let config = Config::load().context("Failed to load config")?;
            match config.get(&key) {
                Some(value) => println!("{}", value),
                None => logger::debug(&format!("{} is not set", key)),
            }
        }
        ConfigAction::Set { key, value } => {
            if !CONFIG_KEYS.contains(&key.as_str()) {
                bail!(unknown_key(&key));
            }
            let mut config = Config::load().context("Failed to load config")?;
            config.set(&key, value.clone())?;
            config.save().context("Failed to save config")?;
            logger::success(&format!("Set {} = {}", key, value));
        }
        ConfigAction::Path { new_path } => {
            let config_path = Config::path()?;
            logger::debug(&format!("Reading config from: {}", config_path.display()));
            let pointer_path = Config::pointer_path()?;

            match new_path {
                Some(p) => {
                    if let Some(parent) = pointer_path.parent() {
                        fs::create_dir_all(parent).context("Failed to set config path")?;
                    }
                    fs::write(&pointer_path, p.as_bytes()).context("Failed to set config path")?;
                    logger::success(&format!("Config path set to {}", p));
                }
                None => {
                    println!("{}", config_path.display());

                    if let Ok(contents) = fs::read_to_string(&pointer_path) {
                        let trimmed = contents.trim();
                        if !trimmed.is_empty() {
                            println!("{} {}", "overridden-by".cyan(), trimmed);
                        }
                    }
                }
            }
        }
    }
    Ok(())
}

fn unknown_key(key: &str) -> String {
    format!(
        "Unknown config key: {}. Currently supported keys: {}",
        key,
        CONFIG_KEYS.join(", ")
    )
}
