//! Unknown-key detection for `topology_config.toml`.
//!
//! The accepted keys are not listed by hand: they are read back from the
//! serialized default [`TopologyConfig`], so a field added to any section is
//! known here as soon as it exists. Raw TOML is checked against that schema
//! before serde sees it, and each stray key becomes a [`ConfigWarning`] with
//! a suggestion taken from the same section. Warnings never stop a load.

use std::collections::{BTreeMap, BTreeSet};

use super::TopologyConfig;

/// A non-fatal config warning (typo, unknown section).
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    pub field: String,
    pub message: String,
    pub suggestion: Option<String>,
}

impl std::fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)?;
        if let Some(ref s) = self.suggestion {
            write!(f, ", did you mean '{s}'?")?;
        }
        Ok(())
    }
}

// ============================================================================
// Schema
// ============================================================================

/// Section name → key names, as `TopologyConfig` serializes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSchema {
    sections: BTreeMap<String, BTreeSet<String>>,
}

impl ConfigSchema {
    /// Schema of the current `TopologyConfig`, or `None` if the defaults
    /// cannot be rendered as a TOML table.
    pub fn current() -> Option<Self> {
        let value = toml::Value::try_from(TopologyConfig::default()).ok()?;
        let sections = value
            .as_table()?
            .iter()
            .filter_map(|(section, body)| {
                let keys = body.as_table()?.keys().cloned().collect();
                Some((section.clone(), keys))
            })
            .collect();
        Some(Self { sections })
    }

    /// Every accepted `section` and `section.key` path.
    pub fn dotted_keys(&self) -> BTreeSet<String> {
        self.sections
            .iter()
            .flat_map(|(section, keys)| {
                std::iter::once(section.clone())
                    .chain(keys.iter().map(move |k| format!("{section}.{k}")))
            })
            .collect()
    }

    /// Closest accepted path for a dotted path that is not accepted.
    ///
    /// Sections are matched against section names. A key is matched only
    /// against keys of its own section, or of the section its misspelled
    /// section most likely meant. A bare top-level key is matched against
    /// every section's keys, since it most likely lost its `[section]` header.
    pub fn suggest(&self, path: &str) -> Option<String> {
        match path.split_once('.') {
            None => {
                if let Some(section) = closest(path, self.sections.keys().map(String::as_str)) {
                    return Some(section.to_string());
                }
                self.sections.iter().find_map(|(section, keys)| {
                    closest(path, keys.iter().map(String::as_str))
                        .map(|k| format!("{section}.{k}"))
                })
            }
            Some((section, key)) => {
                let (section, keys) = match self.sections.get_key_value(section) {
                    Some(found) => found,
                    None => {
                        let guess = closest(section, self.sections.keys().map(String::as_str))?;
                        self.sections.get_key_value(guess)?
                    }
                };
                let key = closest(key, keys.iter().map(String::as_str))?;
                Some(format!("{section}.{key}"))
            }
        }
    }

    /// Warnings for every table or key in `raw` the schema does not accept.
    pub fn check(&self, raw: &toml::Value) -> Vec<ConfigWarning> {
        let Some(root) = raw.as_table() else {
            return Vec::new();
        };
        let mut stray: Vec<String> = Vec::new();

        for (section, body) in root {
            let known = self.sections.get(section);
            if known.is_none() {
                stray.push(section.clone());
            }
            let Some(table) = body.as_table() else {
                continue;
            };
            for key in table.keys() {
                if !known.is_some_and(|keys| keys.contains(key)) {
                    stray.push(format!("{section}.{key}"));
                }
            }
        }

        stray
            .into_iter()
            .map(|field| ConfigWarning {
                message: format!("Unknown config key '{field}'"),
                suggestion: self.suggest(&field),
                field,
            })
            .collect()
    }
}

// ============================================================================
// Matching
// ============================================================================

/// Edit distance counting an adjacent swap as one edit, so `intcat` is one
/// step from `intact`.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let width = b.len() + 1;
    let mut d = vec![0usize; (a.len() + 1) * width];
    let at = |i: usize, j: usize| i * width + j;

    for i in 0..=a.len() {
        d[at(i, 0)] = i;
    }
    for j in 0..=b.len() {
        d[at(0, j)] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let substitution = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (d[at(i - 1, j)] + 1)
                .min(d[at(i, j - 1)] + 1)
                .min(d[at(i - 1, j - 1)] + substitution);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(d[at(i - 2, j - 2)] + 1);
            }
            d[at(i, j)] = best;
        }
    }
    d[at(a.len(), b.len())]
}

/// Longer names tolerate more typos, up to three edits.
fn max_edits(name: &str) -> usize {
    (name.chars().count() / 4).clamp(1, 3)
}

/// Nearest candidate within `max_edits`. Candidates come from sorted sets, so
/// the first of several equally close names wins and results are stable.
fn closest<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let limit = max_edits(name);
    candidates
        .into_iter()
        .map(|c| (edit_distance(name, c), c))
        .filter(|(d, _)| *d <= limit)
        .min_by_key(|(d, _)| *d)
        .map(|(_, c)| c)
}

// ============================================================================
// Entry points
// ============================================================================

/// Every accepted dotted key path of `TopologyConfig`.
pub fn known_config_keys() -> BTreeSet<String> {
    ConfigSchema::current()
        .map(|s| s.dotted_keys())
        .unwrap_or_default()
}

/// Warnings for unknown keys in raw TOML text. Text that does not parse
/// yields nothing here; serde reports it when the config is loaded.
pub fn validate_unknown_keys(raw_toml: &str) -> Vec<ConfigWarning> {
    let (Ok(value), Some(schema)) = (raw_toml.parse::<toml::Value>(), ConfigSchema::current())
    else {
        return Vec::new();
    };
    schema.check(&value)
}
