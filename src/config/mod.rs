//! Topology Configuration Module
//!
//! Builder tolerances and policy defaults loaded from TOML.
//!
//! ## Loading Order
//!
//! 1. `WELL_TOPOLOGY_CONFIG` environment variable (path to TOML file)
//! 2. `topology_config.toml` in the current working directory
//! 3. Built-in defaults
//!
//! The library core always takes `&TopologyConfig` explicitly. The global
//! below exists for the binary, which loads once at startup:
//!
//! ```ignore
//! config::init(TopologyConfig::load());
//! let model = build_topology_model(&snapshot, &request, config::get())?;
//! ```

mod topology_config;
pub mod validation;

pub use topology_config::*;

use std::sync::OnceLock;

/// Global topology configuration, initialized once at startup.
static TOPOLOGY_CONFIG: OnceLock<TopologyConfig> = OnceLock::new();

/// Initialize the global topology configuration.
///
/// Later calls are ignored with a warning.
pub fn init(config: TopologyConfig) {
    if TOPOLOGY_CONFIG.set(config).is_err() {
        tracing::warn!("config::init() called more than once, ignoring");
    }
}

/// Get the global topology configuration, or the built-in defaults when
/// `init()` has not been called.
pub fn get() -> &'static TopologyConfig {
    TOPOLOGY_CONFIG.get_or_init(TopologyConfig::default)
}

/// Check whether the config has been initialized.
pub fn is_initialized() -> bool {
    TOPOLOGY_CONFIG.get().is_some()
}
