//! Configuration loading
//!
//! Mirrors the original's XDG-based `config.toml`: a small, explicit set of
//! paths the rest of the crate is handed by reference, read once at process
//! start.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::errors::ConfigError;

static CONFIG: OnceCell<Arc<Config>> = OnceCell::new();

/// Resolved configuration for a single library instance
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory tree of release folders this crate keeps in sync
    pub music_source_dir: PathBuf,
    /// Where the (out-of-scope) FUSE layer is expected to be mounted
    pub fuse_mount_dir: PathBuf,
    /// Directory holding the cache database and any other derived state
    pub cache_dir: PathBuf,
    /// Full path to the SQLite cache database file
    pub cache_database_path: PathBuf,
}

/// On-disk shape of `config.toml`, before path expansion/defaulting
#[derive(Debug, Deserialize)]
struct RawConfig {
    music_source_dir: String,
    fuse_mount_dir: String,
    cache_dir: Option<String>,
}

impl Config {
    /// Read configuration from `path`, or from the conventional XDG location
    /// if `path` is `None`.
    pub fn read(path_override: Option<&Path>) -> Result<Self, ConfigError> {
        let cfg_path = match path_override {
            Some(p) => p.to_path_buf(),
            None => default_config_path(),
        };

        let raw = std::fs::read_to_string(&cfg_path)
            .map_err(|_| ConfigError::NotFound(cfg_path.clone()))?;
        let data: RawConfig = toml::from_str(&raw)?;

        let cache_dir = match data.cache_dir {
            Some(dir) => expand_tilde(&dir),
            None => default_cache_dir(),
        };
        std::fs::create_dir_all(&cache_dir)?;

        Ok(Self {
            music_source_dir: expand_tilde(&data.music_source_dir),
            fuse_mount_dir: expand_tilde(&data.fuse_mount_dir),
            cache_database_path: cache_dir.join("cache.sqlite3"),
            cache_dir,
        })
    }

    /// Initialize the global configuration singleton
    pub fn init(path_override: Option<&Path>) -> Result<Arc<Config>, ConfigError> {
        let config = CONFIG.get_or_try_init(|| {
            let config = Self::read(path_override)?;
            Ok::<_, ConfigError>(Arc::new(config))
        })?;
        Ok(Arc::clone(config))
    }

    /// Get the global configuration instance
    pub fn get() -> Arc<Config> {
        CONFIG
            .get()
            .map(Arc::clone)
            .expect("Config::init must be called before Config::get")
    }
}

fn default_config_path() -> PathBuf {
    xdg_config_home().join("rose").join("config.toml")
}

fn default_cache_dir() -> PathBuf {
    xdg_cache_home().join("rose")
}

fn xdg_config_home() -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| directories::UserDirs::new().map(|d| d.home_dir().join(".config")))
        .unwrap_or_else(|| PathBuf::from(".config"))
}

fn xdg_cache_home() -> PathBuf {
    std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| directories::UserDirs::new().map(|d| d.home_dir().join(".cache")))
        .unwrap_or_else(|| PathBuf::from(".cache"))
}

fn expand_tilde(raw: &str) -> PathBuf {
    if let Some(rest) = raw.strip_prefix("~/") {
        if let Some(dirs) = directories::UserDirs::new() {
            return dirs.home_dir().join(rest);
        }
    }
    PathBuf::from(raw)
}
