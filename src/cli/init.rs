use std::path::Path;

use crate::config::DEFAULT_CONFIG;
use crate::error::GhtknError;

/// Write the template config to `path` unless a file already exists there.
pub fn run_init(path: &Path) -> Result<(), GhtknError> {
    if path.exists() {
        tracing::warn!(path = %path.display(), "the configuration file already exists");
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, DEFAULT_CONFIG)?;
    tracing::info!(path = %path.display(), "the configuration file has been created");
    Ok(())
}
