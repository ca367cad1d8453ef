use std::cell::OnceCell;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};

use crate::annotation::{self, TimeSeries};
use crate::audio;
use crate::index::{StemIndex, format_index};
use crate::taxonomy::{F0Type, Taxonomy};

use super::Result;

/// Data for constructing a [`Track`].
pub struct NewTrack<I: StemIndex> {
    pub track_id: String,
    pub instrument: String,
    pub file_path: Option<PathBuf>,
    pub stem_idx: I,
    pub raw_idx: Option<I>,
    pub mix_path: Option<PathBuf>,
    pub pitch_path: Option<PathBuf>,
    pub component: Option<String>,
    pub ranking: Option<u32>,
    pub mixing_coefficient: Option<f64>,
}

impl<I: StemIndex> NewTrack<I> {
    /// A track with only its identity and instrument set.
    pub fn new(track_id: impl Into<String>, instrument: impl Into<String>, stem_idx: I) -> Self {
        NewTrack {
            track_id: track_id.into(),
            instrument: instrument.into(),
            file_path: None,
            stem_idx,
            raw_idx: None,
            mix_path: None,
            pitch_path: None,
            component: None,
            ranking: None,
            mixing_coefficient: None,
        }
    }
}

/// One audio asset of a multitrack: a stem or a raw source.
///
/// Equality and hashing use `(track_id, stem_idx, raw_idx)` only, so whether
/// the pitch annotation has been loaded never changes how tracks compare.
/// The lazy cache is not `Sync`; a `Track` belongs to one thread at a time.
#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: String,
    pub instrument: String,
    pub f0_type: F0Type,
    pub file_path: Option<PathBuf>,
    /// Semantic role such as "melody" or "bass". `None` for raw sources.
    pub component: Option<String>,
    pub ranking: Option<u32>,
    pub stem_idx: u32,
    pub raw_idx: Option<u32>,
    pub mixing_coefficient: Option<f64>,
    pub duration: Option<f64>,
    pub mix_path: Option<PathBuf>,
    pitch_path: Option<PathBuf>,
    pitch_annotation: OnceCell<Option<TimeSeries>>,
}

impl Track {
    /// Build a track, probing the audio duration if the file exists.
    /// Pitch annotations are not read until [`Track::pitch_annotation`] is called.
    pub fn new<I: StemIndex>(new: NewTrack<I>, taxonomy: &Taxonomy) -> Result<Self> {
        let stem_idx = new.stem_idx.to_index()?;
        let raw_idx = format_index(new.raw_idx)?;

        let duration = match &new.file_path {
            Some(path) if path.exists() => Some(audio::get_duration(path)?),
            _ => None,
        };

        Ok(Track {
            f0_type: taxonomy.f0_type(&new.instrument),
            track_id: new.track_id,
            instrument: new.instrument,
            file_path: new.file_path,
            component: new.component.filter(|c| !c.is_empty()),
            ranking: new.ranking,
            stem_idx,
            raw_idx,
            mixing_coefficient: new.mixing_coefficient,
            duration,
            mix_path: new.mix_path,
            pitch_path: new.pitch_path,
            pitch_annotation: OnceCell::new(),
        })
    }

    pub fn is_raw(&self) -> bool {
        self.raw_idx.is_some()
    }

    pub fn pitch_path(&self) -> Option<&Path> {
        self.pitch_path.as_deref()
    }

    /// (time, frequency) pairs from the stem's pitch file, read on first call.
    /// `None` if no pitch file is configured or it does not exist.
    pub fn pitch_annotation(&self) -> Result<Option<&TimeSeries>> {
        if let Some(cached) = self.pitch_annotation.get() {
            return Ok(cached.as_ref());
        }
        let loaded = match &self.pitch_path {
            Some(path) => annotation::read_time_series(path)?,
            None => None,
        };
        Ok(self.pitch_annotation.get_or_init(|| loaded).as_ref())
    }

    /// Whether the pitch file has already been read.
    pub fn pitch_loaded(&self) -> bool {
        self.pitch_annotation.get().is_some()
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.track_id == other.track_id
            && self.stem_idx == other.stem_idx
            && self.raw_idx == other.raw_idx
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.track_id.hash(state);
        self.stem_idx.hash(state);
        self.raw_idx.hash(state);
    }
}
