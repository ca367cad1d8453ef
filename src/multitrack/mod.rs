pub mod metadata;
pub mod paths;
pub mod track;

use std::cell::OnceCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::annotation::{self, AnnotationError, TimeSeries};
use crate::audio;
use crate::dataset::Dataset;
use crate::index::{IndexError, StemIndex, format_index};
use crate::taxonomy::TaxonomyError;

use metadata::{Metadata, parse_yes_no};
use paths::TrackPaths;
pub use track::{NewTrack, Track};

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("Invalid track id {0:?}: expected Artist_Title")]
    InvalidTrackId(String),
    #[error("Melody level must be 1, 2 or 3, got {0}")]
    InvalidMelodyLevel(u8),
    #[error("Cannot find metadata for {track_id} (looked in {path})")]
    MetadataNotFound { track_id: String, path: PathBuf },
    #[error("No mixing coefficients for {0}")]
    MissingMixingData(String),
    #[error("Metadata field {field} must be 'yes' or 'no', got {value:?}")]
    InvalidYesNo { field: &'static str, value: String },
    #[error("Malformed ranking in {path} line {line}: {content:?}")]
    Ranking {
        path: PathBuf,
        line: usize,
        content: String,
    },
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Cannot read audio properties of {path}: {source}")]
    Audio {
        path: PathBuf,
        source: lofty::error::LoftyError,
    },
    #[error(transparent)]
    Index(#[from] IndexError),
    #[error(transparent)]
    Annotation(#[from] AnnotationError),
    #[error(transparent)]
    Taxonomy(#[from] TaxonomyError),
}

pub type Result<T> = std::result::Result<T, DatasetError>;

/// Melody definition. Levels 1 and 2 are single f0 contours; level 3 has
/// one f0 column per melodic line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MelodyLevel {
    One,
    Two,
    Three,
}

impl MelodyLevel {
    fn slot(self) -> usize {
        match self {
            MelodyLevel::One => 0,
            MelodyLevel::Two => 1,
            MelodyLevel::Three => 2,
        }
    }
}

impl TryFrom<u8> for MelodyLevel {
    type Error = DatasetError;

    fn try_from(level: u8) -> Result<Self> {
        match level {
            1 => Ok(MelodyLevel::One),
            2 => Ok(MelodyLevel::Two),
            3 => Ok(MelodyLevel::Three),
            other => Err(DatasetError::InvalidMelodyLevel(other)),
        }
    }
}

/// One recording session: its metadata, stems, raw sources and annotations.
///
/// Everything except the melody annotations is loaded in [`MultiTrack::new`].
/// The melody annotations are read on first access and cached; like [`Track`],
/// a `MultiTrack` is `Send` but not `Sync`.
#[derive(Debug)]
pub struct MultiTrack {
    pub track_id: String,
    pub artist: String,
    pub title: String,
    pub paths: TrackPaths,

    pub stems: BTreeMap<u32, Track>,
    /// Raw sources ordered by (stem_idx, raw_idx).
    pub raw_audio: Vec<Track>,
    pub melody_rankings: BTreeMap<u32, u32>,
    pub mixing_coefficients: BTreeMap<u32, f64>,

    pub duration: Option<f64>,
    pub is_excerpt: bool,
    pub has_bleed: bool,
    pub is_instrumental: bool,
    pub has_melody: bool,
    pub origin: String,
    pub genre: String,
    pub metadata_version: String,

    /// Activation confidence rows; column 0 is time. Every row is as wide
    /// as the file header.
    pub stem_activations: Option<Vec<Vec<f64>>>,
    /// Stem index → column of `stem_activations`.
    pub stem_activations_idx: BTreeMap<u32, usize>,

    melody: [OnceCell<Option<Vec<Vec<f64>>>>; 3],
}

impl MultiTrack {
    pub fn new(track_id: &str, dataset: &Dataset) -> Result<Self> {
        let mut parts = track_id.split('_');
        let (artist, title) = match (parts.next(), parts.next()) {
            (Some(a), Some(t)) if !a.is_empty() && !t.is_empty() => {
                (a.to_string(), t.to_string())
            }
            _ => return Err(DatasetError::InvalidTrackId(track_id.to_string())),
        };

        let config = dataset.config();
        let paths = TrackPaths::resolve(
            track_id,
            &config.metadata_dir,
            &config.annotation_dir,
            config.audio_dir.as_deref(),
        );

        if !paths.metadata.exists() {
            return Err(DatasetError::MetadataNotFound {
                track_id: track_id.to_string(),
                path: paths.metadata.clone(),
            });
        }
        log::debug!("Loading {} from {}", track_id, paths.metadata.display());

        let meta = Metadata::load(&paths.metadata)?;
        let melody_rankings = metadata::load_melody_rankings(&paths.ranking)?;
        let mixing_coefficients = dataset
            .mixing_coefficients()
            .get(track_id)
            .cloned()
            .ok_or_else(|| DatasetError::MissingMixingData(track_id.to_string()))?;

        let (stems, raw_audio) = parse_stems(
            track_id,
            &meta,
            &paths,
            &melody_rankings,
            &mixing_coefficients,
            dataset,
        )?;

        let duration = match &paths.mix {
            Some(mix) if mix.exists() => Some(audio::get_duration(mix)?),
            _ => {
                log::warn!("Audio missing for {}", track_id);
                None
            }
        };

        let (stem_activations, stem_activations_idx) =
            load_activations(&paths.activation_conf)?;

        Ok(MultiTrack {
            track_id: track_id.to_string(),
            artist,
            title,
            stems,
            raw_audio,
            melody_rankings,
            mixing_coefficients,
            duration,
            is_excerpt: parse_yes_no("excerpt", &meta.excerpt)?,
            has_bleed: parse_yes_no("has_bleed", &meta.has_bleed)?,
            is_instrumental: parse_yes_no("instrumental", &meta.instrumental)?,
            has_melody: paths.melody[0].exists(),
            origin: meta.origin,
            genre: meta.genre,
            metadata_version: meta.version,
            stem_activations,
            stem_activations_idx,
            paths,
            melody: Default::default(),
        })
    }

    pub fn annotation_dir(&self) -> &Path {
        &self.paths.annotation_dir
    }

    pub fn audio_dir(&self) -> Option<&Path> {
        self.paths.audio_dir.as_deref()
    }

    pub fn mix_path(&self) -> Option<&Path> {
        self.paths.mix.as_deref()
    }

    /// The stem ranked 1 in the melody rankings, if any.
    pub fn predominant_stem(&self) -> Option<&Track> {
        self.melody_rankings
            .iter()
            .find(|&(_, &rank)| rank == 1)
            .and_then(|(idx, _)| self.stems.get(idx))
    }

    /// (time, f0) pairs of melody 1.
    pub fn melody1_annotation(&self) -> Result<Option<TimeSeries>> {
        self.melody_pairs(MelodyLevel::One)
    }

    /// (time, f0) pairs of melody 2.
    pub fn melody2_annotation(&self) -> Result<Option<TimeSeries>> {
        self.melody_pairs(MelodyLevel::Two)
    }

    /// Melody 3 rows: time followed by one f0 column per melodic line.
    pub fn melody3_annotation(&self) -> Result<Option<&[Vec<f64>]>> {
        self.melody_annotation(MelodyLevel::Three)
    }

    /// Full rows of a melody annotation, read on first access and cached.
    pub fn melody_annotation(&self, level: MelodyLevel) -> Result<Option<&[Vec<f64>]>> {
        let cell = &self.melody[level.slot()];
        if let Some(cached) = cell.get() {
            return Ok(cached.as_deref());
        }
        let path = &self.paths.melody[level.slot()];
        let loaded = annotation::read_annotation_file(path, None, false)?.map(|a| a.rows);
        Ok(cell.get_or_init(|| loaded).as_deref())
    }

    fn melody_pairs(&self, level: MelodyLevel) -> Result<Option<TimeSeries>> {
        match self.melody_annotation(level)? {
            Some(rows) => Ok(Some(annotation::time_pairs(rows)?)),
            None => Ok(None),
        }
    }

    pub fn melody_stems(&self) -> Vec<&Track> {
        self.stems_with_component("melody")
    }

    pub fn bass_stems(&self) -> Vec<&Track> {
        self.stems_with_component("bass")
    }

    fn stems_with_component(&self, component: &str) -> Vec<&Track> {
        self.stems
            .values()
            .filter(|t| t.component.as_deref() == Some(component))
            .collect()
    }

    pub fn num_stems(&self) -> usize {
        self.stems.len()
    }

    pub fn num_raw(&self) -> usize {
        self.raw_audio.len()
    }

    /// Sorted stem instrument labels (duplicates kept).
    pub fn stem_instruments(&self) -> Vec<&str> {
        let mut labels: Vec<&str> =
            self.stems.values().map(|t| t.instrument.as_str()).collect();
        labels.sort_unstable();
        labels
    }

    /// Sorted raw-source instrument labels (duplicates kept).
    pub fn raw_instruments(&self) -> Vec<&str> {
        let mut labels: Vec<&str> =
            self.raw_audio.iter().map(|t| t.instrument.as_str()).collect();
        labels.sort_unstable();
        labels
    }

    pub fn stem_filepaths(&self) -> Vec<Option<&Path>> {
        self.stems.values().map(|t| t.file_path.as_deref()).collect()
    }

    pub fn raw_filepaths(&self) -> Vec<Option<&Path>> {
        self.raw_audio.iter().map(|t| t.file_path.as_deref()).collect()
    }

    /// Raw sources belonging to one stem.
    pub fn raw_for_stem(&self, stem_idx: u32) -> impl Iterator<Item = &Track> {
        self.raw_audio.iter().filter(move |t| t.stem_idx == stem_idx)
    }

    /// (time, activation confidence) pairs for a stem, or `None` if the stem
    /// has no column in the activation table.
    pub fn activation_conf_from_stem(&self, stem_idx: u32) -> Option<TimeSeries> {
        let col = *self.stem_activations_idx.get(&stem_idx)?;
        let rows = self.stem_activations.as_ref()?;
        Some(rows.iter().map(|row| (row[0], row[col])).collect())
    }
}

fn parse_stems(
    track_id: &str,
    meta: &Metadata,
    paths: &TrackPaths,
    rankings: &BTreeMap<u32, u32>,
    mixing: &BTreeMap<u32, f64>,
    dataset: &Dataset,
) -> Result<(BTreeMap<u32, Track>, Vec<Track>)> {
    let taxonomy = dataset.taxonomy();
    let mut stems = BTreeMap::new();
    let mut raw_audio = Vec::new();

    for (stem_key, entry) in &meta.stems {
        let stem_idx = stem_key.as_str().to_index()?;
        let ranking = rankings.get(&stem_idx).copied();
        let mix_coeff = mixing.get(&stem_idx).copied();
        if mix_coeff.is_none() {
            log::debug!("{}: no mixing coefficient for stem {}", track_id, stem_key);
        }

        let stem_digits = stem_key.strip_prefix('S').unwrap_or(stem_key.as_str());
        let stem = Track::new(
            NewTrack {
                track_id: track_id.to_string(),
                instrument: entry.instrument.clone(),
                file_path: paths.stem_dir.as_ref().map(|d| d.join(&entry.filename)),
                stem_idx,
                raw_idx: None,
                mix_path: paths.mix.clone(),
                pitch_path: Some(paths.stem_pitch(track_id, stem_digits)),
                component: entry.component.clone(),
                ranking,
                mixing_coefficient: mix_coeff,
            },
            taxonomy,
        )?;
        stems.insert(stem_idx, stem);

        for (raw_key, raw) in entry.raw.iter().flatten() {
            let raw_idx = raw_key.as_str().to_index()?;
            let mut new = NewTrack::new(track_id, raw.instrument.clone(), stem_idx);
            new.raw_idx = Some(raw_idx);
            new.file_path = paths.raw_dir.as_ref().map(|d| d.join(&raw.filename));
            new.mix_path = paths.mix.clone();
            new.ranking = ranking;
            raw_audio.push(Track::new(new, taxonomy)?);
        }
    }

    raw_audio.sort_by_key(|t| (t.stem_idx, t.raw_idx));
    Ok((stems, raw_audio))
}

type Activations = (Option<Vec<Vec<f64>>>, BTreeMap<u32, usize>);

fn load_activations(path: &Path) -> Result<Activations> {
    let Some(table) = annotation::read_annotation_file(path, None, true)? else {
        return Ok((None, BTreeMap::new()));
    };

    let mut idx = BTreeMap::new();
    for (col, name) in table.header.iter().enumerate() {
        if name == "time" {
            continue;
        }
        if let Some(stem_idx) = format_index(Some(name.as_str()))? {
            idx.insert(stem_idx, col);
        }
    }
    Ok((Some(table.rows), idx))
}
