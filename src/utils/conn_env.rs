//! Connection string lookup: explicit value → env var → `.env` in dir.

use anyhow::{Result, bail};
use log::debug;
use std::path::Path;

use crate::utils::config::PackagePaths;

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn try_env_then_dotenv(dir: &Path) -> Option<String> {
    let key = PackagePaths::get().conn_env_key();
    if let Some(s) = non_empty_env(key) {
        return Some(s);
    }
    let env_path = dir.join(".env");
    if env_path.is_file() {
        let _ = dotenvy::from_path(&env_path);
        return non_empty_env(key);
    }
    None
}

/// Resolve the source connection string. `explicit` (CLI or config file) wins.
pub fn resolve_conn_string(explicit: Option<&str>, dir: &Path) -> Result<String> {
    if let Some(s) = explicit.map(str::trim).filter(|s| !s.is_empty()) {
        return Ok(s.to_string());
    }
    if let Some(s) = try_env_then_dotenv(dir) {
        debug!("Connection string found in environment");
        return Ok(s);
    }
    bail!(
        "no source database: pass one on the command line, set it in {}, or set {}",
        PackagePaths::get().config_filename(),
        PackagePaths::get().conn_env_key()
    )
}
