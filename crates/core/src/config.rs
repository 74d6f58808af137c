//! Application configuration layered from a TOML file and `FLASHPEEK_*` environment variables.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::play::PlayConfig;

/// Directory under the user's config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "flashpeek";
const CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "FLASHPEEK";

const DEFAULT_CONFIG: &str = r#"# FlashPeek configuration.
# Every key is optional; environment variables such as
# FLASHPEEK_API_BASE_URL or FLASHPEEK_PLAY__IMAGE_SECONDS take precedence.

# "remote" talks to the REST service, "local" keeps sets in data_dir.
catalog = "remote"
api_base_url = "http://localhost:5000"
request_timeout_secs = 10
# data_dir = "/home/me/.local/share/flashpeek"

[play]
image_seconds = 15
tick_millis = 1000
advance_delay_millis = 1500
correct_award = 10
"#;

/// Where flashcard sets are read from and written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// The REST data service at `api_base_url`.
    #[default]
    Remote,
    /// A JSON file inside `data_dir`.
    Local,
}

/// Resolved application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Catalog backend.
    pub catalog: CatalogSource,
    /// Base URL of the data service, without the `/api` suffix.
    pub api_base_url: String,
    /// Per-request timeout for the data service.
    pub request_timeout_secs: u64,
    /// Storage directory for the local catalog.
    pub data_dir: PathBuf,
    /// Timing and scoring for play sessions.
    pub play: PlayConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            catalog: CatalogSource::default(),
            api_base_url: "http://localhost:5000".to_string(),
            request_timeout_secs: 10,
            data_dir: default_data_dir(),
            play: PlayConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load from the default config path plus environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(config_path())
    }

    /// Load from `path` (which may be missing) plus environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(File::from(path).format(FileFormat::Toml).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let config: AppConfig = settings
            .try_deserialize()
            .with_context(|| format!("invalid configuration in {}", path.display()))?;
        Ok(config)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Default location of `config.toml`.
pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
        .join(CONFIG_FILE)
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR)
}

/// Write a commented default config file if none exists yet.
pub fn ensure_default_config() -> Result<()> {
    write_default_config(config_path())
}

fn write_default_config(path: PathBuf) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write default config {}", path.display()))?;
    info!(path = %path.display(), "Wrote default configuration");
    Ok(())
}
