//! Runtime configuration.
//!
//! The database location comes from, in order: `config.toml`, the
//! `SRS_DATABASE_PATH` environment variable (`.env` is loaded too), the default.

use crate::error::{Result, SrsError};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const DEFAULT_DATABASE_PATH: &str = "db.sqlite3";
pub const DATABASE_PATH_ENV: &str = "SRS_DATABASE_PATH";
pub const CONFIG_FILE: &str = "config.toml";

/// Configuration file structure for config.toml
#[derive(Debug, Deserialize)]
struct AppConfig {
    database: Option<DatabaseConfig>,
}

#[derive(Debug, Deserialize)]
struct DatabaseConfig {
    path: Option<String>,
}

fn database_path_from_file(config_file: &Path) -> Result<Option<PathBuf>> {
    let contents = match std::fs::read_to_string(config_file) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let config: AppConfig = toml::from_str(&contents)
        .map_err(|e| SrsError::Config(format!("{}: {}", config_file.display(), e)))?;
    Ok(config.database.and_then(|db| db.path).map(PathBuf::from))
}

/// Resolves the database path for `config_file` and the current environment.
pub fn resolve_database_path(config_file: &Path) -> Result<PathBuf> {
    if let Some(path) = database_path_from_file(config_file)? {
        tracing::info!("Using database from {}: {}", config_file.display(), path.display());
        return Ok(path);
    }

    if let Ok(path) = std::env::var(DATABASE_PATH_ENV) {
        tracing::info!("Using database from {} env: {}", DATABASE_PATH_ENV, path);
        return Ok(PathBuf::from(path));
    }

    let default = PathBuf::from(DEFAULT_DATABASE_PATH);
    tracing::info!("Using default database path: {}", default.display());
    Ok(default)
}

/// Loads `.env` if present, then resolves against `config.toml`.
pub fn load_database_path() -> Result<PathBuf> {
    let _ = dotenvy::dotenv();
    resolve_database_path(Path::new(CONFIG_FILE))
}
