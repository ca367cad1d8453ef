use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::LazyLock;

use super::{DatasetError, Result};

/// Contents of a `<track_id>_METADATA.yaml` file. Unknown keys are ignored.
#[derive(Debug, Deserialize)]
pub struct Metadata {
    pub excerpt: String,
    pub has_bleed: String,
    pub instrumental: String,
    pub origin: String,
    pub genre: String,
    #[serde(deserialize_with = "scalar_string")]
    pub version: String,
    #[serde(default)]
    pub stems: BTreeMap<String, StemEntry>,
}

#[derive(Debug, Deserialize)]
pub struct StemEntry {
    pub instrument: String,
    #[serde(default)]
    pub component: Option<String>,
    pub filename: String,
    #[serde(default)]
    pub raw: Option<BTreeMap<String, RawEntry>>,
}

#[derive(Debug, Deserialize)]
pub struct RawEntry {
    pub instrument: String,
    pub filename: String,
}

/// `version: 1.2` parses as a float; keep whatever was written as text.
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_yaml::Value::deserialize(deserializer)?;
    match value {
        serde_yaml::Value::String(s) => Ok(s),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a scalar version, got {other:?}"
        ))),
    }
}

impl Metadata {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_yaml::from_str(&contents)?)
    }
}

/// Map a metadata "yes"/"no" field to a bool. Anything else is an error.
pub fn parse_yes_no(field: &'static str, value: &str) -> Result<bool> {
    match value {
        "yes" => Ok(true),
        "no" => Ok(false),
        _ => Err(DatasetError::InvalidYesNo {
            field,
            value: value.to_string(),
        }),
    }
}

// Stem index is the last underscore-delimited number before the extension,
// e.g. LizNelson_Rainfall_STEM_02.wav → 2
static RANKING_STEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(\d+)(?:\.[^._]*)?$").unwrap());

/// Parse the melody ranking file: `filename,rank` per line.
/// A missing file yields an empty map.
pub fn load_melody_rankings(path: &Path) -> Result<BTreeMap<u32, u32>> {
    let mut rankings = BTreeMap::new();
    if !path.exists() {
        log::debug!("No melody ranking file at {}", path.display());
        return Ok(rankings);
    }

    let contents = std::fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    for (i, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let bad_line = || DatasetError::Ranking {
            path: path.to_path_buf(),
            line: i + 1,
            content: line.to_string(),
        };

        let (fname, rank) = line.split_once(',').ok_or_else(bad_line)?;
        let stem_idx: u32 = RANKING_STEM_RE
            .captures(fname.trim())
            .and_then(|caps| caps[1].parse().ok())
            .ok_or_else(bad_line)?;
        let rank: u32 = rank.trim().parse().map_err(|_| bad_line())?;
        rankings.insert(stem_idx, rank);
    }

    Ok(rankings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const METADATA: &str = "\
album: ''
artist: Liz Nelson
excerpt: 'no'
genre: Singer/Songwriter
has_bleed: 'yes'
instrumental: 'no'
origin: Dolan Studio
title: Rainfall
version: 1.2
website: []
stems:
  S01:
    component: melody
    filename: LizNelson_Rainfall_STEM_01.wav
    instrument: female singer
    raw:
      R01:
        filename: LizNelson_Rainfall_RAW_01_01.wav
        instrument: female singer
  S02:
    component: ''
    filename: LizNelson_Rainfall_STEM_02.wav
    instrument: cello
    raw:
      R01: {filename: LizNelson_Rainfall_RAW_02_01.wav, instrument: cello}
      R02: {filename: LizNelson_Rainfall_RAW_02_02.wav, instrument: cello}
";

    #[test]
    fn test_parse_metadata() {
        let meta: Metadata = serde_yaml::from_str(METADATA).unwrap();
        assert_eq!(meta.excerpt, "no");
        assert_eq!(meta.version, "1.2");
        assert_eq!(meta.stems.len(), 2);
        let s2 = &meta.stems["S02"];
        assert_eq!(s2.instrument, "cello");
        assert_eq!(s2.component.as_deref(), Some(""));
        assert_eq!(s2.raw.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn test_version_as_string() {
        let yaml = "\
excerpt: 'no'
has_bleed: 'no'
instrumental: 'yes'
origin: x
genre: y
version: '2.0'
";
        let meta: Metadata = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(meta.version, "2.0");
        assert!(meta.stems.is_empty());
    }

    #[test]
    fn test_missing_required_field() {
        let yaml = "excerpt: 'no'\norigin: x\ngenre: y\nversion: 1\n";
        assert!(serde_yaml::from_str::<Metadata>(yaml).is_err());
    }

    #[test]
    fn test_yes_no() {
        assert!(parse_yes_no("excerpt", "yes").unwrap());
        assert!(!parse_yes_no("excerpt", "no").unwrap());
        assert!(matches!(
            parse_yes_no("has_bleed", "maybe"),
            Err(DatasetError::InvalidYesNo { field: "has_bleed", .. })
        ));
        assert!(parse_yes_no("excerpt", "Yes").is_err());
    }

    #[test]
    fn test_rankings() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.txt");
        std::fs::write(
            &path,
            "LizNelson_Rainfall_STEM_01.wav,1\nLizNelson_Rainfall_STEM_03.wav, 2\n\n",
        )
        .unwrap();
        let rankings = load_melody_rankings(&path).unwrap();
        assert_eq!(rankings.len(), 2);
        assert_eq!(rankings[&1], 1);
        assert_eq!(rankings[&3], 2);
    }

    #[test]
    fn test_rankings_missing_file() {
        let dir = TempDir::new().unwrap();
        let rankings = load_melody_rankings(&dir.path().join("absent.txt")).unwrap();
        assert!(rankings.is_empty());
    }

    #[test]
    fn test_rankings_malformed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("r.txt");
        std::fs::write(&path, "LizNelson_Rainfall_STEM_01.wav,first\n").unwrap();
        assert!(matches!(
            load_melody_rankings(&path),
            Err(DatasetError::Ranking { line: 1, .. })
        ));

        std::fs::write(&path, "no_index_here.wav,1\n").unwrap();
        assert!(load_melody_rankings(&path).is_err());
    }
}
