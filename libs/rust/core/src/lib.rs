//! Core library for the inference gateway: tensor shaping, artifact
//! loading and the prediction service shared by the HTTP layer.

use std::fs::OpenOptions;
use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod error;
pub mod model;
pub mod preprocess;
pub mod service;
pub mod tensor;

pub use crate::config::{load_config, GatewayConfig};
pub use error::{InferenceError, LoadError, PredictError, PreprocessError};
pub use model::{Device, ForwardModel, ModelInfo, OnnxArtifact};
pub use preprocess::Preprocessor;
pub use service::{BatchPrediction, Capabilities, Prediction, PredictionService};
pub use tensor::Tensor;

/// Installs the process-wide subscriber: human-readable lines on stdout plus
/// JSON lines appended to the configured log file. `RUST_LOG` overrides the
/// configured level; the debug flag lowers the default to `debug`.
pub fn init_tracing(service: &str, cfg: &GatewayConfig) -> Result<()> {
    let default_level = if cfg.debug {
        "debug"
    } else {
        cfg.log_level.as_str()
    };
    let filter =
        EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(default_level))?;
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.log_file)?;
    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true);
    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .flatten_event(true)
        .with_ansi(false)
        .with_writer(Arc::new(file));
    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()?;
    info!(target: "sentinel_core", service, "tracing initialized");
    Ok(())
}
