//! Error taxonomy: fatal artifact load errors plus recoverable per-request
//! preprocessing and inference failures.

use std::path::PathBuf;
use thiserror::Error;

/// Artifact missing, unreadable or not invokable. Fatal: aborts startup.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("model artifact not found: {path}")]
    NotFound { path: PathBuf },
    #[error("failed to read model artifact {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("model artifact is not runnable: {reason}")]
    NotRunnable { reason: String },
}

/// Bad shape or type in request input. Recoverable, surfaces per request.
#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("unsupported input type: {0}")]
    UnsupportedType(&'static str),
    #[error("non-numeric value at position {index}")]
    NonNumeric { index: usize },
    #[error("rows must have uniform length: row 0 has {expected}, row {row} has {got}")]
    Ragged {
        expected: usize,
        row: usize,
        got: usize,
    },
    #[error("empty input")]
    Empty,
    #[error("batch element {index}: {source}")]
    BatchElement {
        index: usize,
        #[source]
        source: Box<PreprocessError>,
    },
    #[error("batch element {index} is not a single sample ({rows} rows)")]
    NotSingleSample { index: usize, rows: usize },
}

/// Runtime failure inside the forward computation. Recoverable, per request.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("forward pass failed: {0}")]
    Forward(String),
    #[error("unexpected model output: {0}")]
    Output(String),
}

/// Everything the prediction service catches at its boundary.
#[derive(Debug, Error)]
pub enum PredictError {
    #[error(transparent)]
    Preprocess(#[from] PreprocessError),
    #[error(transparent)]
    Inference(#[from] InferenceError),
}
