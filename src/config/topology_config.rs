//! Topology Configuration - builder tolerances and policy defaults as TOML
//!
//! Each section implements `Default` so that a missing file, a missing section
//! or a missing key all produce the same behavior as the built-in values.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::types::NodeKind;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "WELL_TOPOLOGY_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "topology_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for the topology core.
///
/// Load with `TopologyConfig::load()` which searches:
/// 1. `$WELL_TOPOLOGY_CONFIG` env var
/// 2. `./topology_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TopologyConfig {
    /// Node construction
    #[serde(default)]
    pub nodes: NodeConfig,

    /// Edge construction
    #[serde(default)]
    pub edges: EdgeConfig,

    /// Source inference
    #[serde(default)]
    pub sources: SourceConfig,

    /// Background worker
    #[serde(default)]
    pub worker: WorkerConfig,
}

impl TopologyConfig {
    /// Load configuration using the standard search order:
    /// 1. `$WELL_TOPOLOGY_CONFIG` environment variable
    /// 2. `./topology_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded topology config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded topology config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate TOML text. Unknown keys are logged, never fatal.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self = toml::from_str(contents)
            .map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate tolerances and capacities.
    ///
    /// Rules:
    /// - Tolerances and thicknesses must be finite and positive
    /// - Formation allow-list may only name annulus slots A–D
    /// - Worker channel capacity must be > 0
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors: Vec<String> = Vec::new();

        Self::check_positive(self.nodes.min_layer_thickness, "nodes.min_layer_thickness", &mut errors);
        Self::check_positive(self.edges.depth_tolerance, "edges.depth_tolerance", &mut errors);

        for slot in &self.nodes.formation_slot_allow_list {
            if NodeKind::annulus(*slot).is_none() {
                errors.push(format!(
                    "nodes.formation_slot_allow_list: slot {slot} is not an annulus slot (0-3)"
                ));
            }
        }

        if self.sources.hydrocarbon_fluids.iter().any(|f| f.trim().is_empty()) {
            errors.push("sources.hydrocarbon_fluids: entries must not be empty".to_string());
        }

        if self.worker.channel_capacity == 0 {
            errors.push("worker.channel_capacity must be > 0".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    fn check_positive(value: f64, name: &str, errors: &mut Vec<String>) {
        if !value.is_finite() || value <= 0.0 {
            errors.push(format!("{name} = {value} must be finite and > 0"));
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Parse(PathBuf, toml::de::Error),
    Serialize(toml::ser::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "Config I/O error ({}): {}", path.display(), e),
            ConfigError::Parse(path, e) => {
                write!(f, "Config parse error ({}): {}", path.display(), e)
            }
            ConfigError::Serialize(e) => write!(f, "Config serialization error: {}", e),
            ConfigError::Validation(errors) => {
                writeln!(f, "Config validation failed:")?;
                for e in errors {
                    writeln!(f, "  - {}", e)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

// ============================================================================
// Sections
// ============================================================================

/// Node construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Layers thinner than this (in) contribute no volume
    #[serde(default = "default_min_layer_thickness")]
    pub min_layer_thickness: f64,

    /// Annulus slots whose formation-flagged layers are still modeled as
    /// ANNULUS_{slot} rather than FORMATION_ANNULUS
    #[serde(default)]
    pub formation_slot_allow_list: Vec<u8>,
}

fn default_min_layer_thickness() -> f64 {
    1e-6
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            min_layer_thickness: default_min_layer_thickness(),
            formation_slot_allow_list: Vec::new(),
        }
    }
}

/// Edge construction settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeConfig {
    /// Depth comparison tolerance (ft)
    #[serde(default = "default_depth_tolerance")]
    pub depth_tolerance: f64,

    /// Treat rows with an unknown state as holding
    #[serde(default = "default_true")]
    pub unknown_state_is_intact: bool,
}

fn default_depth_tolerance() -> f64 {
    1e-6
}

fn default_true() -> bool {
    true
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            depth_tolerance: default_depth_tolerance(),
            unknown_state_is_intact: true,
        }
    }
}

/// Source inference settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Fluid names (case-insensitive) treated as sources in illustrative mode
    #[serde(default = "default_hydrocarbon_fluids")]
    pub hydrocarbon_fluids: Vec<String>,
}

fn default_hydrocarbon_fluids() -> Vec<String> {
    vec!["gas".to_string(), "oil".to_string(), "condensate".to_string()]
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            hydrocarbon_fluids: default_hydrocarbon_fluids(),
        }
    }
}

impl SourceConfig {
    pub fn is_hydrocarbon(&self, fluid: &str) -> bool {
        let fluid = fluid.trim();
        self.hydrocarbon_fluids
            .iter()
            .any(|h| h.eq_ignore_ascii_case(fluid))
    }
}

/// Background worker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkerConfig {
    /// Bounded request/response channel capacity
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_channel_capacity() -> usize {
    16
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            channel_capacity: default_channel_capacity(),
        }
    }
}
