use crate::config_manager::Config;
use crate::logger;
use crate::sink::LoggerSink;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use pyseek_registry::{
    dedupe_by_executable, discover_interpreters, scan, InterpreterRecord, MemoryRegistry,
};
use std::path::PathBuf;

#[derive(Args, Debug, Clone, Default)]
pub struct ListCommand {
    /// Print the interpreters as a JSON array
    #[arg(long)]
    pub json: bool,
    /// Drop interpreters whose executable was already listed
    #[arg(long)]
    pub dedupe: bool,
    /// Scan a TOML registry dump instead of the live registry
    #[arg(long, value_name = "TOML")]
    pub registry_file: Option<PathBuf>,
}

pub fn list_interpreters(cmd: &ListCommand, config: &Config) -> Result<()> {
    let records = collect_records(cmd, config)?;
    logger::debug(&format!("found {} interpreter(s)", records.len()));

    if cmd.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", render(&records));
    }
    Ok(())
}

/// Run the scan selected by `cmd` and `config`
pub fn collect_records(cmd: &ListCommand, config: &Config) -> Result<Vec<InterpreterRecord>> {
    let registry_file = cmd
        .registry_file
        .clone()
        .or_else(|| config.registry_file.as_deref().map(PathBuf::from));
    let dedupe = cmd.dedupe || config.dedupe();

    let records: Vec<InterpreterRecord> = match registry_file {
        Some(path) => {
            logger::debug(&format!("scanning registry file {}", path.display()));
            let registry = MemoryRegistry::from_toml_file(&path)
                .with_context(|| format!("Failed to load registry file {}", path.display()))?;
            let records: Vec<InterpreterRecord> = scan(&registry, &LoggerSink).collect();
            records
        }
        None => discover_interpreters(&LoggerSink).collect(),
    };

    if dedupe {
        Ok(dedupe_by_executable(records).collect())
    } else {
        Ok(records)
    }
}

fn render(records: &[InterpreterRecord]) -> String {
    if records.is_empty() {
        return format!("{}\n", "No Python interpreters found".yellow());
    }

    let mut out = format!("{}\n", "Interpreters:".bold().green());
    for record in records {
        let tag = format!(
            "{}{}.{}-{}",
            record.name(),
            record.major(),
            record.minor(),
            record.architecture()
        );
        out.push_str(&format!(
            "  {:<20} {}",
            tag.cyan(),
            record.executable().display()
        ));
        if let Some(args) = record.arguments() {
            out.push_str(&format!(" {}", args.dimmed()));
        }
        out.push('\n');
    }
    out
}
