//! TOML configuration for a gridworld run, read from the per-user config
//! file or an explicit `--config` path.

use std::io;
use std::path::{Path, PathBuf};

use gw_model::World;
use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::mdp::MdpParams;
use crate::solver::{Algorithm, SolverOptions};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub world: World,
    pub mdp: MdpParams,
    pub solver: SolverConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SolverConfig {
    pub algorithm: Algorithm,
    /// Maximum tolerated error in the returned utilities.
    pub epsilon: f64,
    /// Cap on sweeps (value iteration) or improvement rounds (policy iteration).
    pub max_iterations: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        let defaults = SolverOptions::default();
        Self {
            algorithm: Algorithm::Value,
            epsilon: defaults.epsilon,
            max_iterations: defaults.max_iterations,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Print the utilities after every sweep.
    pub history: bool,
    /// Print the Q-value table.
    pub q_values: bool,
    /// Colour terminal payoffs. `NO_COLOR` still wins.
    pub color: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            history: false,
            q_values: false,
            color: true,
        }
    }
}

impl Config {
    /// Load an explicitly requested config file. Missing or malformed is an error.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, path)
    }

    /// Load the per-user config if there is one, falling back to defaults.
    pub fn load_or_default() -> Self {
        let path = config_path();
        match std::fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents, &path).unwrap_or_else(|e| {
                warn!("{e}; using defaults");
                Config::default()
            }),
            Err(_) => Config::default(),
        }
    }

    fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn solver_options(&self) -> SolverOptions {
        SolverOptions {
            epsilon: self.solver.epsilon,
            max_iterations: self.solver.max_iterations,
            record_history: self.output.history,
        }
    }
}

/// `$XDG_CONFIG_HOME/gridworld/config.toml`, or under `~/.config`.
pub fn config_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("gridworld").join("config.toml")
}
