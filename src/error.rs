use std::path::PathBuf;

use thiserror::Error;

pub type CrosswordResult<T> = Result<T, CrosswordError>;

/// Failures while loading or validating a problem definition. Running out of fill options is not
/// one of these; see `FillFailure`.
#[derive(Error, Debug)]
pub enum CrosswordError {
    #[error("Failed to read file {}, more details: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to write file {}, more details: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid grid: {0}")]
    InvalidGrid(String),
}
