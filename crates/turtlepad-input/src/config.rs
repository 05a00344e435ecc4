//! Engine configuration.
//!
//! Tuning knobs for the input engine, loadable from the Turtlepad
//! environment's TOML settings file:
//!
//! ```toml
//! [input]
//! pulse_window_ms = 80
//! text_buffer_capacity = 256
//! default_step_timeout_ms = 500
//! ```
//!
//! Every field has a default, so an empty file (or a file from an older
//! version missing newer fields) still produces a working config.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub input: InputTuning,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            input: InputTuning::default(),
        }
    }
}

/// Input engine tuning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputTuning {
    /// How long `CurrentKeyPress` / `CurrentTextInput` stay visible after
    /// an event before reverting to empty.
    #[serde(default = "default_pulse_window_ms")]
    pub pulse_window_ms: u64,

    /// Capacity of the pending-text buffer; the oldest characters are
    /// evicted first on overflow.
    #[serde(default = "default_text_buffer_capacity")]
    pub text_buffer_capacity: usize,

    /// Step timeout applied to sequence shortcuts registered without one.
    #[serde(default = "default_step_timeout_ms")]
    pub default_step_timeout_ms: u64,
}

fn default_pulse_window_ms() -> u64 {
    80
}

fn default_text_buffer_capacity() -> usize {
    256
}

fn default_step_timeout_ms() -> u64 {
    500
}

impl Default for InputTuning {
    fn default() -> Self {
        Self {
            pulse_window_ms: default_pulse_window_ms(),
            text_buffer_capacity: default_text_buffer_capacity(),
            default_step_timeout_ms: default_step_timeout_ms(),
        }
    }
}

impl EngineConfig {
    /// Parses a config from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Loads a config from a TOML file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// The pulse window as a [`Duration`].
    pub fn pulse_window(&self) -> Duration {
        Duration::from_millis(self.input.pulse_window_ms)
    }

    /// The default sequence step timeout as a [`Duration`].
    pub fn default_step_timeout(&self) -> Duration {
        Duration::from_millis(self.input.default_step_timeout_ms)
    }
}
