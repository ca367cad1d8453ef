use lofty::prelude::*;
use std::path::Path;

use crate::multitrack::{DatasetError, Result};

/// Duration of an audio file in seconds, read from its stream properties.
pub fn get_duration(path: &Path) -> Result<f64> {
    let tagged_file = lofty::read_from_path(path).map_err(|source| DatasetError::Audio {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(tagged_file.properties().duration().as_secs_f64())
}
