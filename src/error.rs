use std::path::PathBuf;

/// Result type for dataset operations
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Error types for loading and serving the satellite dataset
#[derive(Debug)]
pub enum DatasetError {
    /// Configuration that cannot produce a dataset (class count, stats, flip probability, crop size)
    InvalidConfig(String),
    /// The image paired with a label file does not exist
    ImageNotFound(PathBuf),
    /// Sample index outside `[0, len)`
    IndexOutOfRange { index: i64, len: usize },
    /// A label's index and population rows differ in length
    LabelShape { indices: usize, populations: usize },
    /// Label file is missing required tables or columns, or holds unusable values
    MalformedRecord { path: PathBuf, reason: String },
    /// The raster decoder rejected an image
    Raster { path: PathBuf, message: String },
    /// The GeoPackage could not be read
    Vector {
        path: PathBuf,
        source: rusqlite::Error,
    },
    IoError(std::io::Error),
    JsonError(serde_json::Error),
}

impl DatasetError {
    pub fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        DatasetError::MalformedRecord {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for DatasetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DatasetError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            DatasetError::ImageNotFound(path) => write!(f, "Image not found: {:?}", path),
            DatasetError::IndexOutOfRange { index, len } => write!(
                f,
                "Index {} out of range for dataset of length {}",
                index, len
            ),
            DatasetError::LabelShape {
                indices,
                populations,
            } => write!(
                f,
                "Label has {} indices but {} population counts",
                indices, populations
            ),
            DatasetError::MalformedRecord { path, reason } => {
                write!(f, "Malformed label file {:?}: {}", path, reason)
            }
            DatasetError::Raster { path, message } => {
                write!(f, "Failed to decode raster {:?}: {}", path, message)
            }
            DatasetError::Vector { path, source } => {
                write!(f, "Failed to read vector file {:?}: {}", path, source)
            }
            DatasetError::IoError(e) => write!(f, "I/O error: {}", e),
            DatasetError::JsonError(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for DatasetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DatasetError::Vector { source, .. } => Some(source),
            DatasetError::IoError(e) => Some(e),
            DatasetError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DatasetError {
    fn from(error: std::io::Error) -> Self {
        DatasetError::IoError(error)
    }
}

impl From<serde_json::Error> for DatasetError {
    fn from(error: serde_json::Error) -> Self {
        DatasetError::JsonError(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_index_out_of_range() {
        let err = DatasetError::IndexOutOfRange { index: -1, len: 4 };
        assert_eq!(
            err.to_string(),
            "Index -1 out of range for dataset of length 4"
        );
    }

    #[test]
    fn test_display_label_shape() {
        let err = DatasetError::LabelShape {
            indices: 2,
            populations: 1,
        };
        assert_eq!(err.to_string(), "Label has 2 indices but 1 population counts");
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error;
        let err: DatasetError =
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing").into();
        assert!(err.source().is_some());
        assert!(DatasetError::InvalidConfig("x".into()).source().is_none());
    }
}
