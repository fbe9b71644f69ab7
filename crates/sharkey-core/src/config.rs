use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{SharkeyError, SharkeyResult};

/// Top-level configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SharkeyConfig {
    pub log: LogConfig,
    pub generate: GenerateConfig,
    pub combine: CombineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Log level (default: warn)
    pub level: String,
    /// Log format: "json" or "text"
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    /// Print the base64 seed in the SECRET section
    pub display_seed: bool,
    /// Print the age secret key in the SECRET section
    pub display_secret_key: bool,
    /// How shares are rendered for display
    pub share_format: ShareDisplay,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CombineConfig {
    /// Let an empty line end share collection below the threshold
    pub allow_early_finish: bool,
    /// Hide share input while typing
    pub hide_input: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShareDisplay {
    #[default]
    Symbolic,
    Words,
    Both,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "warn".into(),
            format: "text".into(),
        }
    }
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            display_seed: true,
            display_secret_key: true,
            share_format: ShareDisplay::Symbolic,
        }
    }
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            allow_early_finish: false,
            hide_input: true,
        }
    }
}

impl SharkeyConfig {
    /// Load configuration from `path`, falling back to defaults when the
    /// file does not exist.
    pub fn load(path: &Path) -> SharkeyResult<Self> {
        if !path.exists() {
            tracing::debug!("config file not found: {}  (using defaults)", path.display());
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| SharkeyError::Config(format!("parsing {}: {e}", path.display())))
    }
}

/// Default config location: `~/.config/sharkey/config.toml`. `None` when
/// `HOME` is unset or not an absolute path; no config file is read then.
pub fn default_config_path() -> Option<PathBuf> {
    config_path_under(std::env::var_os("HOME"))
}

fn config_path_under(home: Option<OsString>) -> Option<PathBuf> {
    home.map(PathBuf::from)
        .filter(|home| home.is_absolute())
        .map(|home| home.join(".config/sharkey/config.toml"))
}
