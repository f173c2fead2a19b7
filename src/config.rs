// Configuration for the todo CLI
//
// Read from `--config <path>`, else `<data_dir>/config.yaml` when present,
// else defaults. Command-line flags override whatever the file says.

use crate::snapshot::DEFAULT_KEY;
use crate::sqlite::SqliteStorage;
use crate::storage::{FileStorage, MemoryStorage, Storage, validate_key};
use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE: &str = "config.yaml";
pub const DATABASE_FILE: &str = "todo.db";

/// Where the task snapshot is stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per key in the data directory
    #[default]
    File,
    /// Key/value table in `<data_dir>/todo.db`
    Sqlite,
    /// Nothing survives the process
    Memory,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: Backend,
    pub storage_key: String,
    /// tracing level: error, warn, info, debug or trace
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: Backend::default(),
            storage_key: DEFAULT_KEY.to_string(),
            log_level: "warn".to_string(),
        }
    }
}

/// `<local data dir>/todostore`, or `./.todostore` when the platform has none
pub fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("todostore"))
        .unwrap_or_else(|| PathBuf::from(".todostore"))
}

/// Config file as written; absent keys fall back per lookup
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    backend: Option<Backend>,
    storage_key: Option<String>,
    log_level: Option<String>,
}

impl Config {
    /// Parse a YAML config file
    ///
    /// Keys the file omits take their defaults. The result is not validated,
    /// so command-line overrides can still replace bad values; call
    /// `validate` once they are applied.
    pub fn from_file(path: &Path) -> Result<Self> {
        Self::read_file(path, default_data_dir())
    }

    fn read_file(path: &Path, default_dir: PathBuf) -> Result<Self> {
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let file: ConfigFile = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        let defaults = Self::default();
        Ok(Self {
            data_dir: file.data_dir.unwrap_or(default_dir),
            backend: file.backend.unwrap_or(defaults.backend),
            storage_key: file.storage_key.unwrap_or(defaults.storage_key),
            log_level: file.log_level.unwrap_or(defaults.log_level),
        })
    }

    /// Resolve the config the way the CLI does
    ///
    /// An explicit `path` must exist. Otherwise `config.yaml` inside
    /// `data_dir` (or the default data directory) is used when present, and
    /// that directory is the data directory unless the file names another.
    pub fn load(path: Option<&Path>, data_dir: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            debug!(path = ?path, "Loading config");
            return Self::from_file(path);
        }

        let dir = data_dir.map(Path::to_path_buf).unwrap_or_else(default_data_dir);
        let candidate = dir.join(CONFIG_FILE);
        if candidate.exists() {
            debug!(path = ?candidate, "Loading config");
            return Self::read_file(&candidate, dir);
        }

        debug!(dir = ?dir, "No config file, using defaults");
        Ok(Self {
            data_dir: dir,
            ..Self::default()
        })
    }

    /// Replace file values with the ones given on the command line
    pub fn with_overrides(
        mut self,
        data_dir: Option<PathBuf>,
        backend: Option<Backend>,
        storage_key: Option<String>,
    ) -> Self {
        if let Some(dir) = data_dir {
            self.data_dir = dir;
        }
        if let Some(backend) = backend {
            self.backend = backend;
        }
        if let Some(key) = storage_key {
            self.storage_key = key;
        }
        self
    }

    pub fn validate(&self) -> Result<()> {
        validate_key(&self.storage_key).context("Invalid storage_key in config")?;
        self.log_level
            .parse::<tracing::Level>()
            .map_err(|_| eyre::eyre!("Invalid log_level in config: {}", self.log_level))?;
        Ok(())
    }

    /// Open the configured storage backend
    pub fn open_storage(&self) -> Result<Box<dyn Storage>> {
        let storage: Box<dyn Storage> = match self.backend {
            Backend::File => Box::new(FileStorage::open(&self.data_dir)?),
            Backend::Sqlite => Box::new(SqliteStorage::open(self.data_dir.join(DATABASE_FILE))?),
            Backend::Memory => Box::new(MemoryStorage::new()),
        };
        Ok(storage)
    }
}
