use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Non-numeric value {value:?} in {path} line {line}")]
    Parse {
        path: PathBuf,
        line: usize,
        value: String,
    },
    #[error("Row {row} has {len} column(s), expected at least 2")]
    ShortRow { row: usize, len: usize },
    #[error("{path} line {line} has {len} column(s), header has {expected}")]
    RowWidth {
        path: PathBuf,
        line: usize,
        len: usize,
        expected: usize,
    },
}

/// Time-aligned (time in seconds, value) pairs: f0 in Hz for melody and
/// pitch annotations, confidence for activations.
pub type TimeSeries = Vec<(f64, f64)>;

/// Rows of a comma-separated annotation file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Annotation {
    pub rows: Vec<Vec<f64>>,
    /// Header cells. Empty unless the file was read with `header = true`.
    pub header: Vec<String>,
}

/// Read an annotation file.
///
/// Returns `Ok(None)` (with a warning) if the file does not exist; annotation
/// files are optional throughout the dataset. When `num_cols` is given only the
/// first `num_cols` columns of each row are kept, which matters for pitch files
/// exported by Tony: their third column is sometimes empty. `Some(0)` is the
/// same as `None`: no limit.
///
/// A non-numeric value is an error, not a skipped row. With `header = true`
/// every row must be exactly as wide as the (possibly truncated) header.
pub fn read_annotation_file(
    path: &Path,
    num_cols: Option<usize>,
    header: bool,
) -> Result<Option<Annotation>, AnnotationError> {
    if !path.exists() {
        log::warn!("{} does not exist", path.display());
        return Ok(None);
    }

    let io_err = |source| AnnotationError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let reader = BufReader::new(file);

    let limit = num_cols.filter(|&n| n > 0);
    let mut annotation = Annotation::default();
    let mut header_pending = header;

    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(io_err)?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields = line.split(',');
        let fields: Vec<&str> = match limit {
            Some(n) => fields.take(n).collect(),
            None => fields.collect(),
        };

        if header_pending {
            annotation.header = fields.iter().map(|s| s.trim().to_string()).collect();
            header_pending = false;
            continue;
        }
        if header && fields.len() != annotation.header.len() {
            return Err(AnnotationError::RowWidth {
                path: path.to_path_buf(),
                line: i + 1,
                len: fields.len(),
                expected: annotation.header.len(),
            });
        }

        let row = fields
            .iter()
            .map(|field| {
                field.trim().parse::<f64>().map_err(|_| AnnotationError::Parse {
                    path: path.to_path_buf(),
                    line: i + 1,
                    value: field.to_string(),
                })
            })
            .collect::<Result<Vec<f64>, _>>()?;
        annotation.rows.push(row);
    }

    log::debug!(
        "Read {} rows from {}",
        annotation.rows.len(),
        path.display()
    );
    Ok(Some(annotation))
}

/// Convert annotation rows into (time, value) pairs using the first two columns.
pub fn time_pairs(rows: &[Vec<f64>]) -> Result<TimeSeries, AnnotationError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| match row.as_slice() {
            [t, v, ..] => Ok((*t, *v)),
            _ => Err(AnnotationError::ShortRow {
                row: i,
                len: row.len(),
            }),
        })
        .collect()
}

/// Read a (time, value) annotation such as a stem pitch contour, keeping the
/// first two columns.
pub fn read_time_series(path: &Path) -> Result<Option<TimeSeries>, AnnotationError> {
    match read_annotation_file(path, Some(2), false)? {
        Some(annotation) => Ok(Some(time_pairs(&annotation.rows)?)),
        None => Ok(None),
    }
}
