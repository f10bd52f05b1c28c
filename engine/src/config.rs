use serde::Deserialize;
use std::{
    env, fs,
    path::{Path, PathBuf},
};
use thiserror::Error;

use crate::routing::ContinuationTable;

/// Overrides the default config location.
pub const CONFIG_ENV: &str = "SWITCHYARD_CONFIG";

// Default value function for serde (bool::default() is false, so only true needs a fn)
pub(crate) const fn default_true() -> bool {
    true
}

const fn default_effect_ms() -> u64 {
    180
}

#[derive(Debug, Default, Deserialize)]
pub struct SwitchyardConfig {
    pub presentation: Option<PresentationConfig>,
    pub orchestrator: Option<OrchestratorConfig>,
    /// Successor flows consulted when a flow ends normally.
    #[serde(default)]
    pub continuation: ContinuationTable,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config at {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. } | ConfigError::Parse { path, .. } => path,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PresentationConfig {
    /// Animate presents and dismissals unless a request says otherwise.
    #[serde(default = "default_true")]
    pub animated: bool,
    /// Length of one animated transition, in milliseconds.
    #[serde(default = "default_effect_ms")]
    pub effect_ms: u64,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            animated: true,
            effect_ms: default_effect_ms(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default)]
    pub modal_underlay: ModalUnderlay,
    /// Drop a queued `begin` when the same flow is already queued.
    #[serde(default = "default_true")]
    pub coalesce_duplicates: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            modal_underlay: ModalUnderlay::default(),
            coalesce_duplicates: true,
        }
    }
}

/// How a non-modal flow requested while a modal is up is handled.
///
/// Either way the controller is begun, paused and recorded as the primary.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ModalUnderlay {
    /// Present it once the modal ends.
    #[default]
    Deferred,
    /// Present it immediately, beneath the modal.
    Beneath,
}

/// Runtime knobs for an [`Orchestrator`](crate::Orchestrator).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorSettings {
    pub animated: bool,
    pub modal_underlay: ModalUnderlay,
    pub coalesce_duplicates: bool,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            animated: true,
            modal_underlay: ModalUnderlay::Deferred,
            coalesce_duplicates: true,
        }
    }
}

impl SwitchyardConfig {
    pub fn load() -> Result<Option<Self>, ConfigError> {
        let path = match config_path() {
            Some(path) => path,
            None => return Ok(None),
        };
        Self::load_from(&path)
    }

    /// A missing file is not an error.
    pub fn load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Ok(Some(config)),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                Err(ConfigError::Parse {
                    path: path.to_path_buf(),
                    source: err,
                })
            }
        }
    }

    #[must_use]
    pub fn path() -> Option<PathBuf> {
        config_path()
    }

    #[must_use]
    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        let defaults = OrchestratorSettings::default();
        OrchestratorSettings {
            animated: self
                .presentation
                .as_ref()
                .map_or(defaults.animated, |p| p.animated),
            modal_underlay: self
                .orchestrator
                .as_ref()
                .map_or(defaults.modal_underlay, |o| o.modal_underlay),
            coalesce_duplicates: self
                .orchestrator
                .as_ref()
                .map_or(defaults.coalesce_duplicates, |o| o.coalesce_duplicates),
        }
    }

    #[must_use]
    pub fn effect_ms(&self) -> u64 {
        self.presentation
            .as_ref()
            .map_or_else(default_effect_ms, |p| p.effect_ms)
    }
}

/// `$SWITCHYARD_CONFIG`, else `~/.switchyard/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::home_dir().map(|home| home.join(".switchyard").join("config.toml"))
}
