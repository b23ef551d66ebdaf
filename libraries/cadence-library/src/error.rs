use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while reading the local library
#[derive(Debug, Error)]
pub enum LibraryError {
    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Path exists but cannot be scanned
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Lofty error
    #[error("Metadata error: {0}")]
    Lofty(#[from] lofty::error::LoftyError),

    /// No artwork found in file
    #[error("No artwork found in {0}")]
    NoArtwork(String),

    /// Artwork too large
    #[error("Artwork too large: {0} bytes (max {1} bytes)")]
    TooLarge(usize, usize),

    /// Blocking scan task did not finish
    #[error("Scan task failed: {0}")]
    Task(String),
}

/// Result type for library operations
pub type Result<T> = std::result::Result<T, LibraryError>;

impl From<LibraryError> for cadence_core::CadenceError {
    fn from(err: LibraryError) -> Self {
        use cadence_core::CadenceError;

        match err {
            LibraryError::FileNotFound(path) => {
                CadenceError::not_found("File", path.display().to_string())
            }
            LibraryError::NoArtwork(locator) => CadenceError::not_found("Artwork", locator),
            LibraryError::Io(e) => CadenceError::Io(e),
            LibraryError::Lofty(e) => CadenceError::metadata(e.to_string()),
            LibraryError::InvalidPath(msg) => CadenceError::invalid_input(msg),
            LibraryError::TooLarge(size, max) => {
                CadenceError::invalid_input(format!("artwork of {size} bytes exceeds {max}"))
            }
            LibraryError::Task(msg) => CadenceError::catalog(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::CadenceError;

    #[test]
    fn missing_artwork_maps_to_not_found() {
        let err: CadenceError = LibraryError::NoArtwork("/music/a.flac".into()).into();
        assert!(err.is_not_found());
    }

    #[test]
    fn invalid_path_maps_to_invalid_input() {
        let err: CadenceError = LibraryError::InvalidPath("not a dir".into()).into();
        assert!(matches!(err, CadenceError::InvalidInput(_)));
    }
}
