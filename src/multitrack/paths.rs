use std::path::{Path, PathBuf};

/// Every path derived from a track id and the dataset roots.
///
/// Audio paths are `None` when no audio root is configured: metadata-only
/// access is a supported mode.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackPaths {
    pub metadata: PathBuf,
    pub annotation_dir: PathBuf,
    pub pitch_dir: PathBuf,
    pub ranking: PathBuf,
    pub activation_conf: PathBuf,
    pub melody: [PathBuf; 3],
    pub audio_dir: Option<PathBuf>,
    pub stem_dir: Option<PathBuf>,
    pub raw_dir: Option<PathBuf>,
    pub mix: Option<PathBuf>,
}

impl TrackPaths {
    pub fn resolve(
        track_id: &str,
        metadata_root: &Path,
        annotation_root: &Path,
        audio_root: Option<&Path>,
    ) -> Self {
        let annotation_dir = annotation_root.join(format!("{track_id}_ANNOTATIONS"));
        let audio_dir = audio_root.map(|root| root.join(track_id));

        TrackPaths {
            metadata: metadata_root.join(format!("{track_id}_METADATA.yaml")),
            pitch_dir: annotation_dir.join(format!("{track_id}_PITCH")),
            ranking: annotation_dir.join(format!("{track_id}_RANKING.txt")),
            activation_conf: annotation_dir.join(format!("{track_id}_ACTIVATION_CONF.lab")),
            melody: [1, 2, 3].map(|n| annotation_dir.join(format!("{track_id}_MELODY{n}.csv"))),
            stem_dir: audio_dir.as_ref().map(|d| d.join(format!("{track_id}_STEMS"))),
            raw_dir: audio_dir.as_ref().map(|d| d.join(format!("{track_id}_RAW"))),
            mix: audio_dir.as_ref().map(|d| d.join(format!("{track_id}_MIX.wav"))),
            audio_dir,
            annotation_dir,
        }
    }

    /// Pitch contour file for a stem. `stem_digits` is the stem key without its
    /// `S` prefix, kept verbatim so `S01` maps to `..._STEM_01.csv`.
    pub fn stem_pitch(&self, track_id: &str, stem_digits: &str) -> PathBuf {
        self.pitch_dir.join(format!("{track_id}_STEM_{stem_digits}.csv"))
    }
}
