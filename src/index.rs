use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum IndexError {
    #[error("Invalid stem/raw index: {0:?}")]
    Invalid(String),
}

/// A stem or raw index as it appears in the dataset: either already numeric
/// or in prefixed string form (`S05`, `R02`).
pub trait StemIndex {
    fn to_index(&self) -> Result<u32, IndexError>;
}

impl StemIndex for u32 {
    fn to_index(&self) -> Result<u32, IndexError> {
        Ok(*self)
    }
}

impl StemIndex for &str {
    fn to_index(&self) -> Result<u32, IndexError> {
        // Only one uppercase prefix char is stripped: "SR01" and "s01" are invalid.
        let raw: &str = self;
        let digits = raw
            .strip_prefix('S')
            .or_else(|| raw.strip_prefix('R'))
            .unwrap_or(raw);
        digits
            .parse::<u32>()
            .map_err(|_| IndexError::Invalid(raw.to_string()))
    }
}

impl StemIndex for String {
    fn to_index(&self) -> Result<u32, IndexError> {
        self.as_str().to_index()
    }
}

/// Normalize a stem or raw index to its integer form.
/// `None` stays `None`; the numeric range is not checked.
pub fn format_index<I: StemIndex>(index: Option<I>) -> Result<Option<u32>, IndexError> {
    index.map(|i| i.to_index()).transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_strings() {
        assert_eq!(format_index(Some("S05")), Ok(Some(5)));
        assert_eq!(format_index(Some("R02")), Ok(Some(2)));
        assert_eq!(format_index(Some("S10")), Ok(Some(10)));
        assert_eq!(format_index(Some("07")), Ok(Some(7)));
    }

    #[test]
    fn test_integer_passthrough() {
        assert_eq!(format_index(Some(5u32)), Ok(Some(5)));
        assert_eq!(format_index(Some(0u32)), Ok(Some(0)));
    }

    #[test]
    fn test_none() {
        assert_eq!(format_index::<&str>(None), Ok(None));
        assert_eq!(format_index::<u32>(None), Ok(None));
    }

    #[test]
    fn test_owned_string() {
        assert_eq!(format_index(Some("S07".to_string())), Ok(Some(7)));
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert!(format_index(Some("s05")).is_err());
        assert!(format_index(Some("r02")).is_err());
    }

    #[test]
    fn test_single_prefix_only() {
        assert_eq!(
            format_index(Some("SR01")),
            Err(IndexError::Invalid("SR01".to_string()))
        );
        assert!(format_index(Some("S")).is_err());
        assert!(format_index(Some("")).is_err());
    }
}
