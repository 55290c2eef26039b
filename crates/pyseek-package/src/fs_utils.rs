use std::fs;
use std::io;
use std::path::Path;

/// Remove `path` recursively if present, then recreate it empty.
///
/// Removal errors are ignored; only a failure to recreate the directory is
/// returned.
pub fn ensure_empty_dir(path: &Path) -> io::Result<()> {
    if path.exists() {
        tracing::info!("  removing {}", path.display());
        let _ = fs::remove_dir_all(path);
    }
    fs::create_dir_all(path)
}
