//! Host-level settings the bundler is constructed with.
//!
//! Everything the staleness logic depends on (root anchors, the
//! development/production mode gate, the force-rebuild override) is carried
//! here explicitly so tests can build any host state without touching
//! process environment.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::roots::Roots;

/// The host's run mode.
///
/// Source files are only collected and rebuilds only considered in
/// `Development`; `Production` trusts the artifacts already on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    #[must_use]
    pub fn is_development(self) -> bool {
        matches!(self, Mode::Development)
    }
}

/// Configuration supplied by the host application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    pub roots: Roots,
    #[serde(default = "default_mode")]
    pub mode: Mode,
    /// Recompile on every save regardless of staleness. Meant for CI and
    /// debugging, not normal operation.
    #[serde(default)]
    pub force_rebuild: bool,
}

fn default_mode() -> Mode {
    Mode::Production
}

impl HostConfig {
    /// A production config with no force override.
    pub fn new(roots: Roots) -> Self {
        Self {
            roots,
            mode: default_mode(),
            force_rebuild: false,
        }
    }

    /// Read and parse a host config TOML file.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or contains invalid TOML.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_str_toml(&content).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                source,
            },
            other => other,
        })
    }

    /// Parse a host config from a TOML string.
    ///
    /// # Errors
    /// Returns an error if the string is not valid config TOML.
    pub fn from_str_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_owned(),
            source: e,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid host config at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}
