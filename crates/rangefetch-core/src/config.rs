use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Initial width of a window before any shrink (64 KiB).
pub const CHUNK_SIZE: u64 = 64 * 1024;
/// Recoverable failures tolerated across one whole transfer.
pub const MAX_RETRIES: u32 = 20;
/// Attempts for the sizing probe.
pub const MAX_SIZE_RETRIES: u32 = 5;
/// Connect timeout for every request.
pub const CONNECT_TIMEOUT: Duration = Duration::from_millis(5000);
/// Abort a request when no bytes arrive for this long.
pub const READ_TIMEOUT: Duration = Duration::from_millis(10000);

/// Tunables for one download (optional `config.toml`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Target window width in bytes.
    pub chunk_size: u64,
    /// Global retry budget for the range phase.
    pub max_retries: u32,
    /// Attempts for the sizing probe.
    pub max_size_retries: u32,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: CHUNK_SIZE,
            max_retries: MAX_RETRIES,
            max_size_retries: MAX_SIZE_RETRIES,
        }
    }
}

impl DownloadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be at least 1 byte");
        }
        if self.max_size_retries == 0 {
            anyhow::bail!("max_size_retries must be at least 1");
        }
        Ok(())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("rangefetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DownloadConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DownloadConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: DownloadConfig = toml::from_str(&data)?;
    cfg.validate()?;
    Ok(cfg)
}
