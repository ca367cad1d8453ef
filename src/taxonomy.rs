use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;

const BUILTIN_TAXONOMY: &str = include_str!("../resources/taxonomy.yaml");
const BUILTIN_F0_TYPES: &str = include_str!("../resources/instrument_f0_type.yaml");

#[derive(Error, Debug)]
pub enum TaxonomyError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Fundamental-frequency character of a sound source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum F0Type {
    #[serde(rename = "m")]
    Monophonic,
    #[serde(rename = "p")]
    Polyphonic,
    #[serde(rename = "u")]
    Unpitched,
    #[serde(skip)]
    Unknown,
}

impl F0Type {
    /// Single-letter code used in the f0 type table ("?" for unknown).
    pub fn code(&self) -> &'static str {
        match self {
            Self::Monophonic => "m",
            Self::Polyphonic => "p",
            Self::Unpitched => "u",
            Self::Unknown => "?",
        }
    }
}

impl fmt::Display for F0Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Monophonic => "monophonic",
            Self::Polyphonic => "polyphonic",
            Self::Unpitched => "unpitched",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// The closed set of instrument labels plus the instrument → f0 type lookup.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    labels: HashSet<String>,
    f0_types: HashMap<String, F0Type>,
}

impl Taxonomy {
    /// Taxonomy shipped with the crate.
    pub fn builtin() -> Result<Self, TaxonomyError> {
        Self::from_yaml(BUILTIN_TAXONOMY, BUILTIN_F0_TYPES)
    }

    /// Build from a nested taxonomy document and an instrument → `m|p|u` document.
    pub fn from_yaml(taxonomy: &str, f0_types: &str) -> Result<Self, TaxonomyError> {
        let tree: Value = serde_yaml::from_str(taxonomy)?;
        let labels = dict_leaves(&tree)
            .into_iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect();
        let f0_types: HashMap<String, F0Type> = serde_yaml::from_str(f0_types)?;
        Ok(Self { labels, f0_types })
    }

    /// Load both documents from disk. Either path may be `None` to use the
    /// built-in document for that half.
    pub fn load(
        taxonomy_path: Option<&Path>,
        f0_types_path: Option<&Path>,
    ) -> Result<Self, TaxonomyError> {
        let taxonomy = match taxonomy_path {
            Some(p) => read(p)?,
            None => BUILTIN_TAXONOMY.to_string(),
        };
        let f0_types = match f0_types_path {
            Some(p) => read(p)?,
            None => BUILTIN_F0_TYPES.to_string(),
        };
        let tax = Self::from_yaml(&taxonomy, &f0_types)?;
        log::info!(
            "Loaded taxonomy: {} instrument labels, {} f0 types",
            tax.labels.len(),
            tax.f0_types.len()
        );
        Ok(tax)
    }

    /// Case-sensitive: taxonomy labels are all lowercase.
    pub fn is_valid_instrument(&self, instrument: &str) -> bool {
        self.labels.contains(instrument)
    }

    pub fn f0_type(&self, instrument: &str) -> F0Type {
        self.f0_types
            .get(instrument)
            .copied()
            .unwrap_or(F0Type::Unknown)
    }

    pub fn valid_instrument_labels(&self) -> &HashSet<String> {
        &self.labels
    }
}

fn read(path: &Path) -> Result<String, TaxonomyError> {
    std::fs::read_to_string(path).map_err(|source| TaxonomyError::Io {
        path: path.display().to_string(),
        source,
    })
}

/// Collect every non-mapping value of a nested mapping into a set.
/// Sequences expand into their elements; duplicates collapse.
pub fn dict_leaves(value: &Value) -> HashSet<Value> {
    let mut leaves = HashSet::new();
    collect_leaves(value, &mut leaves);
    leaves
}

fn collect_leaves(value: &Value, leaves: &mut HashSet<Value>) {
    match value {
        Value::Mapping(map) => {
            for v in map.values() {
                collect_leaves(v, leaves);
            }
        }
        Value::Sequence(seq) => {
            leaves.extend(seq.iter().cloned());
        }
        Value::Tagged(tagged) => collect_leaves(&tagged.value, leaves),
        other => {
            leaves.insert(other.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_taxonomy() -> Taxonomy {
        Taxonomy::builtin().unwrap()
    }

    #[test]
    fn test_dict_leaves_nested() {
        let value: Value = serde_yaml::from_str("a:\n  b: 1\n  c: 2\nd: 3\n").unwrap();
        let leaves = dict_leaves(&value);
        let expected: HashSet<Value> = [1u64, 2, 3].into_iter().map(Value::from).collect();
        assert_eq!(leaves, expected);
    }

    #[test]
    fn test_dict_leaves_sequences_expand_and_dedup() {
        let value: Value =
            serde_yaml::from_str("x:\n  - flute\n  - oboe\ny:\n  z:\n    - flute\n").unwrap();
        let leaves = dict_leaves(&value);
        assert_eq!(leaves.len(), 2);
        assert!(leaves.contains(&Value::from("flute")));
        assert!(leaves.contains(&Value::from("oboe")));
    }

    #[test]
    fn test_is_valid_instrument_case_sensitive() {
        let tax = test_taxonomy();
        assert!(tax.is_valid_instrument("clarinet"));
        assert!(!tax.is_valid_instrument("Clarinet"));
        assert!(!tax.is_valid_instrument("mayonnaise"));
    }

    #[test]
    fn test_f0_types() {
        let tax = test_taxonomy();
        assert_eq!(tax.f0_type("flute"), F0Type::Monophonic);
        assert_eq!(tax.f0_type("piano"), F0Type::Polyphonic);
        assert_eq!(tax.f0_type("drum set"), F0Type::Unpitched);
        assert_eq!(tax.f0_type("kazoo"), F0Type::Unknown);
        assert_eq!(F0Type::Unknown.code(), "?");
    }

    #[test]
    fn test_every_label_has_f0_type() {
        let tax = test_taxonomy();
        for label in tax.valid_instrument_labels() {
            assert_ne!(tax.f0_type(label), F0Type::Unknown, "{label}");
        }
    }

    #[test]
    fn test_custom_documents() {
        let tax = Taxonomy::from_yaml("winds:\n  - kazoo\n", "kazoo: m\n").unwrap();
        assert!(tax.is_valid_instrument("kazoo"));
        assert!(!tax.is_valid_instrument("flute"));
        assert_eq!(tax.f0_type("kazoo"), F0Type::Monophonic);
    }

    #[test]
    fn test_bad_f0_code_is_error() {
        assert!(Taxonomy::from_yaml("a: [x]\n", "x: q\n").is_err());
    }
}
