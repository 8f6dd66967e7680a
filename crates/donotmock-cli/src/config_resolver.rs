//! Locates and loads the configuration for a run.
//!
//! Lookup order: the `--config` path, then `donotmock.toml` or
//! `.donotmock.toml` next to the analyzed sources, then
//! `$DONOTMOCK_CONFIG_DIR/config.toml` (default `~/.donotmock/config.toml`).
//! With none of them present the built-in defaults apply.

use anyhow::{Context, Result};
use donotmock_core::Config;
use std::path::{Path, PathBuf};

const PROJECT_CONFIG_NAMES: &[&str] = &["donotmock.toml", ".donotmock.toml"];

const GLOBAL_CONFIG_NAME: &str = "config.toml";

/// Loads the configuration that applies to `target`.
///
/// `target` may be a directory or a single source file; a file looks for
/// project config in its own directory.
///
/// # Errors
///
/// Returns an error if the chosen file cannot be read or parsed. An
/// explicit path that does not exist is an error.
pub fn load_config(target: &Path, explicit: Option<&Path>) -> Result<Config> {
    load_from(find_config(target, explicit, global_config_dir()))
}

fn load_from(path: Option<PathBuf>) -> Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No config found, using defaults");
        return Ok(Config::default());
    };
    tracing::info!("Using config: {}", path.display());
    Config::from_file(&path).with_context(|| format!("Failed to load config: {}", path.display()))
}

fn find_config(
    target: &Path,
    explicit: Option<&Path>,
    global_dir: Option<PathBuf>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    let project_dir = if target.is_file() {
        target.parent().unwrap_or(target)
    } else {
        target
    };
    for name in PROJECT_CONFIG_NAMES {
        let candidate = project_dir.join(name);
        if candidate.exists() {
            return Some(candidate);
        }
    }

    global_dir
        .map(|dir| dir.join(GLOBAL_CONFIG_NAME))
        .filter(|candidate| candidate.exists())
}

/// `$DONOTMOCK_CONFIG_DIR`, else `~/.donotmock/`.
fn global_config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("DONOTMOCK_CONFIG_DIR") {
        return Some(PathBuf::from(dir));
    }
    home::home_dir().map(|h| h.join(".donotmock"))
}
