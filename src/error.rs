use thiserror::Error;

/// Errors produced while sweeping, loading data or preprocessing images.
#[derive(Debug, Error)]
pub enum Error {
    /// A hyperparameter combination that cannot produce a valid model
    #[error("Invalid hyperparameter: {0}")]
    InvalidHyperparameter(String),
    /// Malformed or inconsistent dataset contents
    #[error("Dataset error: {0}")]
    Dataset(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Model serialization error: {0}")]
    Serialization(#[from] bincode::Error),
    #[error("Metrics serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
