use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::codec::LogFormat;
use crate::store::LogStore;

/// Environment variable that overrides the data directory.
pub const DATA_DIR_ENV: &str = "CLILOG_DIR";

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClilogConfig {
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub mirror: MirrorConfig,
    #[serde(default)]
    pub lock: LockConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    #[serde(default = "default_log_file")]
    pub file: PathBuf,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub durable: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            format: LogFormat::default(),
            durable: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MirrorConfig {
    #[serde(default = "default_mirror_file")]
    pub file: PathBuf,
    #[serde(default = "default_true")]
    pub auto_sync: bool,
    #[serde(default = "default_rebuild_deadline_ms")]
    pub rebuild_deadline_ms: u64,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            file: default_mirror_file(),
            auto_sync: default_true(),
            rebuild_deadline_ms: default_rebuild_deadline_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    #[serde(default = "default_lock_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_lock_timeout_ms(),
        }
    }
}

/// Concrete file locations after resolving relative names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    pub data_dir: PathBuf,
    pub log: PathBuf,
    pub mirror: PathBuf,
}

impl ClilogConfig {
    /// Resolve the log and mirror paths against `data_dir`.
    #[must_use]
    pub fn resolve_paths(&self, data_dir: &Path) -> ResolvedPaths {
        ResolvedPaths {
            data_dir: data_dir.to_path_buf(),
            log: data_dir.join(&self.log.file),
            mirror: data_dir.join(&self.mirror.file),
        }
    }

    #[must_use]
    pub const fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock.timeout_ms)
    }

    #[must_use]
    pub const fn rebuild_deadline(&self) -> Duration {
        Duration::from_millis(self.mirror.rebuild_deadline_ms)
    }

    /// Build a [`LogStore`] for the resolved log path with these settings.
    #[must_use]
    pub fn open_store(&self, paths: &ResolvedPaths) -> LogStore {
        LogStore::new(&paths.log, self.log.format)
            .with_lock_timeout(self.lock_timeout())
            .with_durable(self.log.durable)
    }
}

/// Locate the data directory: `$CLILOG_DIR`, else `~/.clilog`.
///
/// # Errors
///
/// Returns an error if neither the override nor a home directory is
/// available.
pub fn data_dir() -> Result<PathBuf> {
    resolve_data_dir(env::var_os(DATA_DIR_ENV).map(PathBuf::from), dirs::home_dir())
}

fn resolve_data_dir(override_dir: Option<PathBuf>, home: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = override_dir.filter(|d| !d.as_os_str().is_empty()) {
        return Ok(dir);
    }
    match home {
        Some(home) => Ok(home.join(".clilog")),
        None => bail!("cannot determine home directory; set {DATA_DIR_ENV}"),
    }
}

/// Load `<data_dir>/config.toml`, falling back to defaults when absent.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config(data_dir: &Path) -> Result<ClilogConfig> {
    let path = data_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(ClilogConfig::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<ClilogConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Write `<data_dir>/config.toml` with every default spelled out, unless a
/// config file already exists. Returns whether a file was written.
///
/// # Errors
///
/// Returns an error if the directory or file cannot be written.
pub fn write_default_config(data_dir: &Path) -> Result<bool> {
    let path = data_dir.join(CONFIG_FILE);
    if path.exists() {
        return Ok(false);
    }

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;
    let body = toml::to_string_pretty(&ClilogConfig::default())
        .context("Failed to serialize default config")?;
    std::fs::write(&path, body).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}

fn default_log_file() -> PathBuf {
    PathBuf::from("notes.log")
}

fn default_mirror_file() -> PathBuf {
    PathBuf::from("clilog.db")
}

const fn default_true() -> bool {
    true
}

const fn default_rebuild_deadline_ms() -> u64 {
    30_000
}

const fn default_lock_timeout_ms() -> u64 {
    5_000
}
