use thiserror::Error;

/// An error raised while saving or loading a path.
#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed path data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("control point {index} has a non-finite component")]
    NonFinite { index: usize },
    #[error("control point {index} has a zero-length rotation")]
    DegenerateRotation { index: usize },
}

pub type Result<T> = std::result::Result<T, Error>;
