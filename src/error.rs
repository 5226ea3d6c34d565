//! Error types for dataset construction, splitting and decoding.
use thiserror::Error;

use crate::trial::Split;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DatasetError {
    #[error("'{0}' is not a valid split. Use one of: {}", Split::allowed())]
    InvalidSplit(String),

    #[error("fold index {0} out of range, expected 0, 1 or 2")]
    FoldIndex(usize),

    #[error("outer fold {fold} holds {trials} trial(s), at least 3 are needed for the nested split")]
    TooFewTrials { fold: usize, trials: usize },

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("decoding failed: {0}")]
    Decode(String),
}

pub type DatasetResult<T> = std::result::Result<T, DatasetError>;
