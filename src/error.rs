//! Error type for the simulation engine

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SimError {
    /// Caller supplied a value the engine refuses to store
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Configuration file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid JSON for the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
