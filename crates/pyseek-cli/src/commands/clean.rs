use crate::logger;
use anyhow::{Context, Result};
use pyseek_package::ensure_empty_dir;
use std::path::Path;

/// Empty `dir`, creating it if needed
pub fn clean_dir(dir: &Path) -> Result<()> {
    ensure_empty_dir(dir).with_context(|| format!("Failed to clean {}", dir.display()))?;
    logger::success(&format!("Cleaned {}", dir.display()));
    Ok(())
}
