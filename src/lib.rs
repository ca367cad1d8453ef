pub mod annotation;
pub mod audio;
pub mod config;
pub mod dataset;
pub mod index;
pub mod mixing;
pub mod multitrack;
pub mod taxonomy;

#[cfg(test)]
mod testutil;

pub use annotation::{Annotation, TimeSeries, read_annotation_file};
pub use audio::get_duration;
pub use config::DatasetConfig;
pub use dataset::Dataset;
pub use index::format_index;
pub use multitrack::{DatasetError, MelodyLevel, MultiTrack, Track};
pub use taxonomy::{F0Type, Taxonomy, dict_leaves};

/// Application name for XDG paths
pub const APP_NAME: &str = "medleydb";
