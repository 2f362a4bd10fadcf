use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "TEMPO_LOG";
const DEFAULT_DIRECTIVE: &str = "tempo=info";
const LOG_FILE: &str = "tempo.log";

/// `TEMPO_LOG` when set and valid, otherwise `tempo=info`. The `tempo`
/// target prefix covers every crate of the workspace.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

fn open_log(dir: &Path) -> Result<(File, PathBuf)> {
    std::fs::create_dir_all(dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    Ok((file, path))
}

/// Routes `tracing` output to `<dir>/tempo.log`. The terminal belongs to
/// the UI, so nothing is written to stdout or stderr.
pub fn init(dir: &Path) -> Result<PathBuf> {
    let (file, path) = open_log(dir)?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install log subscriber: {e}"))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_file_is_created_under_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("logs");
        let (_file, path) = open_log(&nested).unwrap();
        assert_eq!(path, nested.join("tempo.log"));
        assert!(path.exists());
    }

    #[test]
    fn default_filter_targets_workspace_crates() {
        assert_eq!(EnvFilter::new(DEFAULT_DIRECTIVE).to_string(), "tempo=info");
    }
}
