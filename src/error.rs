use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeatureError {
    #[error("Failed to decode {}: {message}", path.display())]
    Decode { path: PathBuf, message: String },

    #[error("Degenerate input: {0}")]
    DegenerateInput(String),

    #[error(
        "Feature schema mismatch in segment {segment} at column {position}: expected `{expected}`, found `{found}`"
    )]
    SchemaMismatch {
        segment: usize,
        position: usize,
        expected: String,
        found: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),
}

impl FeatureError {
    pub(crate) fn decode(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        FeatureError::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Contract violations abort a batch; everything else is isolated to one file.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FeatureError::SchemaMismatch { .. })
    }
}

pub type Result<T> = std::result::Result<T, FeatureError>;
