//! Fixtures for unit tests: a throwaway dataset tree in a temp directory.

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::config::DatasetConfig;
use crate::dataset::Dataset;
use crate::mixing::MixingCoefficients;
use crate::taxonomy::Taxonomy;

pub const RAINFALL_METADATA: &str = "\
album: ''
artist: LizNelson
composer: [Liz Nelson]
excerpt: 'no'
genre: Singer/Songwriter
has_bleed: 'yes'
instrumental: 'no'
mix_filename: LizNelson_Rainfall_MIX.wav
origin: Dolan Studio
producer: [Nigel Jones]
raw_dir: LizNelson_Rainfall_RAW
stem_dir: LizNelson_Rainfall_STEMS
title: Rainfall
version: 1.2
website: []
stems:
  S01:
    component: melody
    filename: LizNelson_Rainfall_STEM_01.wav
    instrument: female singer
    raw:
      R01: {filename: LizNelson_Rainfall_RAW_01_01.wav, instrument: female singer}
  S02:
    component: ''
    filename: LizNelson_Rainfall_STEM_02.wav
    instrument: cello
    raw:
      R02: {filename: LizNelson_Rainfall_RAW_02_02.wav, instrument: cello}
      R01: {filename: LizNelson_Rainfall_RAW_02_01.wav, instrument: cello}
  S03:
    component: bass
    filename: LizNelson_Rainfall_STEM_03.wav
    instrument: electric bass
    raw:
      R01: {filename: LizNelson_Rainfall_RAW_03_01.wav, instrument: electric bass}
";

/// A dataset root laid out as `Metadata/`, `Annotations/`, `Audio/`.
pub struct Fixture {
    dir: TempDir,
    mixing: Vec<(String, Vec<(u32, f64)>)>,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        for sub in ["Metadata", "Annotations", "Audio"] {
            std::fs::create_dir_all(dir.path().join(sub)).unwrap();
        }
        let fx = Fixture {
            dir,
            mixing: Vec::new(),
        };
        fx.write_mixing();
        fx
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn with_metadata(self, track_id: &str, yaml: &str) -> Self {
        let path = self
            .root()
            .join("Metadata")
            .join(format!("{track_id}_METADATA.yaml"));
        std::fs::write(path, yaml).unwrap();
        self
    }

    pub fn with_mixing(mut self, track_id: &str, weights: &[(u32, f64)]) -> Self {
        self.mixing.push((track_id.to_string(), weights.to_vec()));
        self.write_mixing();
        self
    }

    pub fn with_annotation(self, track_id: &str, name: &str, contents: &str) -> Self {
        let dir = self
            .root()
            .join("Annotations")
            .join(format!("{track_id}_ANNOTATIONS"));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(name), contents).unwrap();
        self
    }

    /// Write a silent WAV of `secs` seconds under `Audio/<track_id>/<name>`.
    pub fn with_audio(self, track_id: &str, name: &str, secs: f32) -> Self {
        let path = self.root().join("Audio").join(track_id).join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        write_wav(&path, secs);
        self
    }

    pub fn config(&self, with_audio: bool) -> DatasetConfig {
        DatasetConfig::from_root(self.root(), with_audio)
    }

    pub fn dataset(&self, with_audio: bool) -> Dataset {
        let mut mixing = MixingCoefficients::default();
        for (id, weights) in &self.mixing {
            mixing.insert(id.clone(), weights.iter().copied().collect());
        }
        Dataset::new(self.config(with_audio), Taxonomy::builtin().unwrap(), mixing)
    }

    fn write_mixing(&self) {
        let mut yaml = String::from("{}\n");
        if !self.mixing.is_empty() {
            yaml.clear();
            for (id, weights) in &self.mixing {
                if weights.is_empty() {
                    yaml.push_str(&format!("{id}: {{}}\n"));
                    continue;
                }
                yaml.push_str(&format!("{id}:\n"));
                for (idx, w) in weights {
                    yaml.push_str(&format!("  {idx}: {w:?}\n"));
                }
            }
        }
        let path: PathBuf = self.root().join("Metadata").join("mixing_coefficients.yaml");
        std::fs::write(path, yaml).unwrap();
    }
}

/// Write a mono 16-bit 44.1 kHz silent WAV.
pub fn write_wav(path: &Path, secs: f32) {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 44_100,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).unwrap();
    let num_samples = (secs * spec.sample_rate as f32) as usize;
    for _ in 0..num_samples {
        writer.write_sample(0i16).unwrap();
    }
    writer.finalize().unwrap();
}
