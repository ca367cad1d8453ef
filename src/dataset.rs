use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::DatasetConfig;
use crate::mixing::MixingCoefficients;
use crate::multitrack::{DatasetError, MultiTrack, Result, Track};
use crate::taxonomy::Taxonomy;

const METADATA_SUFFIX: &str = "_METADATA.yaml";

/// A dataset on disk: root paths plus the global tables every
/// [`MultiTrack`] is built against.
#[derive(Debug, Clone)]
pub struct Dataset {
    config: DatasetConfig,
    taxonomy: Taxonomy,
    mixing: MixingCoefficients,
}

pub struct LoadResult {
    pub loaded: Vec<MultiTrack>,
    pub failed: Vec<(String, DatasetError)>,
}

impl Dataset {
    /// Open a dataset, loading the taxonomy and mixing-coefficient table
    /// named by the config.
    pub fn open(config: DatasetConfig) -> Result<Self> {
        let taxonomy = Taxonomy::load(
            config.taxonomy_path.as_deref(),
            config.f0_types_path.as_deref(),
        )?;
        let mixing = MixingCoefficients::load(&config.resolve_mixing_coefficients_path())?;
        Ok(Self::new(config, taxonomy, mixing))
    }

    pub fn new(config: DatasetConfig, taxonomy: Taxonomy, mixing: MixingCoefficients) -> Self {
        Self {
            config,
            taxonomy,
            mixing,
        }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn mixing_coefficients(&self) -> &MixingCoefficients {
        &self.mixing
    }

    pub fn multitrack(&self, track_id: &str) -> Result<MultiTrack> {
        MultiTrack::new(track_id, self)
    }

    /// Track ids with a metadata file, sorted.
    pub fn track_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = WalkDir::new(&self.config.metadata_dir)
            .max_depth(1)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| {
                e.file_name()
                    .to_str()
                    .and_then(|name| name.strip_suffix(METADATA_SUFFIX))
                    .map(str::to_string)
            })
            .collect();
        ids.sort();
        ids
    }

    /// Load every multitrack in the dataset. Failures are collected, not fatal.
    ///
    /// Each multitrack is built on one worker thread and handed back whole,
    /// so no instance is ever shared between threads.
    pub fn load_all(&self) -> LoadResult {
        let ids = self.track_ids();
        let pb = ProgressBar::new(ids.len() as u64);
        if let Ok(style) = ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb.set_message("Loading...");

        let results: Vec<(String, Result<MultiTrack>)> = ids
            .into_par_iter()
            .map(|id| {
                let result = self.multitrack(&id);
                pb.inc(1);
                (id, result)
            })
            .collect();

        let mut loaded = Vec::new();
        let mut failed = Vec::new();
        for (id, result) in results {
            match result {
                Ok(mtrack) => loaded.push(mtrack),
                Err(e) => {
                    log::warn!("Failed to load {}: {}", id, e);
                    failed.push((id, e));
                }
            }
        }

        pb.finish_with_message(format!(
            "Done: {} loaded, {} failed",
            loaded.len(),
            failed.len()
        ));
        LoadResult { loaded, failed }
    }
}

/// Stems and raw sources across `multitracks` labelled `instrument`.
pub fn tracks_with_instrument<'a>(
    multitracks: &'a [MultiTrack],
    instrument: &str,
) -> Vec<&'a Track> {
    multitracks
        .iter()
        .flat_map(|m| m.stems.values().chain(m.raw_audio.iter()))
        .filter(|t| t.instrument == instrument)
        .collect()
}
