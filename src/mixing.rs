use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::multitrack::{DatasetError, Result};

/// Per-track stem mixing weights, keyed by track id then stem index.
#[derive(Debug, Clone, Default)]
pub struct MixingCoefficients {
    tracks: HashMap<String, BTreeMap<u32, f64>>,
}

impl MixingCoefficients {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let table = Self::from_yaml(&contents)?;
        log::info!(
            "Loaded mixing coefficients for {} tracks from {}",
            table.tracks.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn from_yaml(contents: &str) -> Result<Self> {
        let tracks = serde_yaml::from_str(contents)?;
        Ok(Self { tracks })
    }

    pub fn get(&self, track_id: &str) -> Option<&BTreeMap<u32, f64>> {
        self.tracks.get(track_id)
    }

    pub fn insert(&mut self, track_id: impl Into<String>, weights: BTreeMap<u32, f64>) {
        self.tracks.insert(track_id.into(), weights);
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml() {
        let table = MixingCoefficients::from_yaml(
            "LizNelson_Rainfall:\n  1: 0.8\n  2: 1.0\nAimeeNorwich_Child:\n  1: 0.5\n",
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        let weights = table.get("LizNelson_Rainfall").unwrap();
        assert_eq!(weights.get(&1), Some(&0.8));
        assert_eq!(weights.get(&2), Some(&1.0));
        assert!(table.get("Nobody_Nothing").is_none());
    }

    #[test]
    fn test_missing_file() {
        let err = MixingCoefficients::load(Path::new("/nonexistent/mix.yaml")).unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }
}
