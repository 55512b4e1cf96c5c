//! Config Validation Tests
//!
//! Typo detection and range validation for `topology_config.toml`, exercised
//! through the public loading API.

use std::io::Write;

use well_topology::config::validation::{ConfigSchema, known_config_keys, validate_unknown_keys};
use well_topology::config::{ConfigError, TopologyConfig};

// ============================================================================
// Typo Detection
// ============================================================================

#[test]
fn typo_in_edges_section_warns_with_suggestion() {
    let toml_str = r#"
[edges]
unknown_state_is_intcat = false
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert_eq!(warnings.len(), 1, "Expected exactly 1 warning");
    assert!(warnings[0].field.contains("unknown_state_is_intcat"));
    assert_eq!(
        warnings[0].suggestion.as_deref(),
        Some("edges.unknown_state_is_intact")
    );
}

#[test]
fn misspelled_section_is_reported() {
    let warnings = validate_unknown_keys("[nodse]\nmin_layer_thickness = 0.1\n");
    let fields: Vec<&str> = warnings.iter().map(|w| w.field.as_str()).collect();
    assert!(fields.contains(&"nodse"));
    assert!(fields.contains(&"nodse.min_layer_thickness"));
    let section = warnings.iter().find(|w| w.field == "nodse").unwrap();
    assert_eq!(section.suggestion.as_deref(), Some("nodes"));
    let key = warnings
        .iter()
        .find(|w| w.field == "nodse.min_layer_thickness")
        .unwrap();
    assert_eq!(key.suggestion.as_deref(), Some("nodes.min_layer_thickness"));
}

#[test]
fn complete_config_produces_zero_warnings() {
    let toml_str = r#"
[nodes]
min_layer_thickness = 0.001
formation_slot_allow_list = [2]

[edges]
depth_tolerance = 0.01
unknown_state_is_intact = true

[sources]
hydrocarbon_fluids = ["gas", "oil"]

[worker]
channel_capacity = 4
"#;
    let warnings = validate_unknown_keys(toml_str);
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
}

#[test]
fn every_known_leaf_key_round_trips_through_default_serialization() {
    let rendered = TopologyConfig::default().to_toml().unwrap();
    assert!(validate_unknown_keys(&rendered).is_empty());
    let known = known_config_keys();
    assert!(known.contains("worker.channel_capacity"));
    let schema = ConfigSchema::current().expect("default config renders as a table");
    assert_eq!(
        schema.suggest("worker.chanel_capacity").as_deref(),
        Some("worker.channel_capacity")
    );
    assert_eq!(
        schema.suggest("wroker.channel_capacity").as_deref(),
        Some("worker.channel_capacity")
    );
}

// ============================================================================
// Range Validation
// ============================================================================

#[test]
fn negative_tolerance_is_rejected() {
    let err = TopologyConfig::from_toml_str("[edges]\ndepth_tolerance = -1.0\n").unwrap_err();
    match err {
        ConfigError::Validation(errors) => {
            assert_eq!(errors.len(), 1);
            assert!(errors[0].contains("edges.depth_tolerance"));
        }
        other => panic!("expected validation error, got {other}"),
    }
}

#[test]
fn zero_tolerance_is_rejected() {
    let Err(ConfigError::Validation(errors)) =
        TopologyConfig::from_toml_str("[edges]\ndepth_tolerance = 0.0\n")
    else {
        panic!("a zero depth tolerance must not validate");
    };
    assert_eq!(errors, vec!["edges.depth_tolerance = 0 must be finite and > 0".to_string()]);
}

#[test]
fn multiple_violations_are_collected_together() {
    let toml_str = r#"
[nodes]
formation_slot_allow_list = [7]

[sources]
hydrocarbon_fluids = [" "]

[worker]
channel_capacity = 0
"#;
    let Err(ConfigError::Validation(errors)) = TopologyConfig::from_toml_str(toml_str) else {
        panic!("expected validation failure");
    };
    assert_eq!(errors.len(), 3, "errors: {errors:?}");
}

#[test]
fn unknown_keys_never_fail_loading() {
    let config = TopologyConfig::from_toml_str("[worker]\nthreads = 8\n").unwrap();
    assert_eq!(config, TopologyConfig::default());
}

// ============================================================================
// File Loading
// ============================================================================

#[test]
fn load_from_file_reads_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[sources]\nhydrocarbon_fluids = [\"methane\"]").unwrap();

    let config = TopologyConfig::load_from_file(file.path()).unwrap();
    assert!(config.sources.is_hydrocarbon("METHANE"));
    assert!(!config.sources.is_hydrocarbon("gas"));
    assert_eq!(config.edges, TopologyConfig::default().edges);
}

#[test]
fn parse_error_names_the_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "[edges\ndepth_tolerance = ").unwrap();

    let err = TopologyConfig::load_from_file(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse(ref p, _) if p == file.path()));
    assert!(err.to_string().contains("Config parse error"));
}

#[test]
fn missing_file_is_an_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = TopologyConfig::load_from_file(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Io(..)));
}
