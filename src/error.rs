use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid reference range for {name}: min {min} is greater than max {max}")]
    InvalidRange { name: String, min: f64, max: f64 },

    #[error("reference table contains a parameter with an empty name")]
    EmptyParameterName,

    #[error("symptom table contains an empty phrase")]
    EmptySymptomPhrase,

    #[error("parameter {0} appears more than once in the reference table")]
    DuplicateParameter(String),

    #[error("failed to compile search pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("failed to parse table: {0}")]
    Table(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("text extraction failed: {0}")]
    Extraction(String),

    #[error("failed to load model from {path}: {message}")]
    Model { path: PathBuf, message: String },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
