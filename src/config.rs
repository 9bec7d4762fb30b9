//! Interpreter configuration (`smpl.toml`)
//!
//! Every field has a default, so an absent or empty file is valid:
//!
//! ```toml
//! [eval]
//! max_call_depth = 10000
//!
//! [repl]
//! prompt = "smpl> "
//! history_file = ".smpl_history"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File looked up in the working directory when no `--config` is given
pub const CONFIG_FILE_NAME: &str = "smpl.toml";

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file {file}: {error}")]
    Io {
        file: PathBuf,
        error: std::io::Error,
    },

    #[error("Invalid TOML in {file}: {error}")]
    Parse {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub eval: EvalConfig,
    pub repl: ReplConfig,
}

/// Evaluator limits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EvalConfig {
    /// Nested procedure calls allowed before `RecursionLimit`
    pub max_call_depth: usize,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplConfig {
    pub prompt: String,
    pub history_file: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            prompt: "smpl> ".to_string(),
            history_file: None,
        }
    }
}

impl Config {
    /// Parse configuration text; `origin` is only used in error messages
    pub fn from_toml(text: &str, origin: &Path) -> ConfigResult<Self> {
        let config: Config = toml::from_str(text).map_err(|error| ConfigError::Parse {
            file: origin.to_path_buf(),
            error,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load an explicit configuration file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
            file: path.to_path_buf(),
            error,
        })?;
        tracing::debug!("loaded configuration from {}", path.display());
        Self::from_toml(&text, path)
    }

    /// Load `smpl.toml` from `dir` if present, defaults otherwise
    pub fn discover(dir: &Path) -> ConfigResult<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            Self::load(&path)
        } else {
            tracing::debug!("no {} in {}, using defaults", CONFIG_FILE_NAME, dir.display());
            Ok(Self::default())
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.eval.max_call_depth == 0 {
            return Err(ConfigError::InvalidValue {
                field: "eval.max_call_depth".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
