//! Orchestration of preprocess -> infer -> serialize for single and batch
//! requests. Every failure inside that path is caught here and converted to
//! a `success:false` outcome; the process never crashes on a bad request.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::error;

use crate::error::{PredictError, PreprocessError};
use crate::model::{Device, ForwardModel, ModelInfo};
use crate::preprocess::Preprocessor;
use crate::tensor::Tensor;

/// Stateless across requests apart from the one-time loaded artifact, which
/// is injected so tests can substitute a stub model.
pub struct PredictionService {
    model: Arc<dyn ForwardModel>,
    preprocessor: Preprocessor,
    info: ModelInfo,
}

/// Outcome of a single prediction; on failure `error` replaces the payload.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    pub success: bool,
    pub prediction: Option<Vec<Vec<f32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
    pub model_info: ModelInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Aggregate outcome of a batch; all-or-nothing, no partial success.
#[derive(Debug, Clone, Serialize)]
pub struct BatchPrediction {
    pub success: bool,
    pub predictions: Option<Vec<Vec<f32>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<Vec<usize>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub model_info: ModelInfo,
    pub supported_input_types: Vec<&'static str>,
    pub batch_support: bool,
    pub device: Device,
}

impl PredictionService {
    pub fn new(model: Arc<dyn ForwardModel>) -> Self {
        let info = model.describe();
        Self {
            model,
            preprocessor: Preprocessor::new(),
            info,
        }
    }

    pub fn model_info(&self) -> &ModelInfo {
        &self.info
    }

    pub fn predict(&self, raw: &Value) -> Prediction {
        match self.try_predict(raw) {
            Ok(output) => Prediction {
                success: true,
                prediction: Some(output.to_nested()),
                shape: Some(output.shape().to_vec()),
                model_info: self.info.clone(),
                error: None,
            },
            Err(e) => {
                error!(error = %e, "prediction failed");
                Prediction {
                    success: false,
                    prediction: None,
                    shape: None,
                    model_info: self.info.clone(),
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn try_predict(&self, raw: &Value) -> Result<Tensor, PredictError> {
        let input = self.preprocessor.process(raw, Some(self.info.input_size))?;
        Ok(self.model.infer(&input)?)
    }

    /// Preprocesses every element individually (element order becomes batch
    /// order), stacks them into one `[N, features]` tensor and runs a single
    /// forward pass. One failing element fails the whole batch.
    pub fn predict_batch(&self, raw: &[Value]) -> BatchPrediction {
        match self.try_predict_batch(raw) {
            Ok(output) => BatchPrediction {
                success: true,
                predictions: Some(output.to_nested()),
                batch_size: Some(raw.len()),
                shape: Some(output.shape().to_vec()),
                error: None,
            },
            Err(e) => {
                error!(error = %e, batch_size = raw.len(), "batch prediction failed");
                BatchPrediction {
                    success: false,
                    predictions: None,
                    batch_size: None,
                    shape: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }

    fn try_predict_batch(&self, raw: &[Value]) -> Result<Tensor, PredictError> {
        let mut rows = Vec::with_capacity(raw.len());
        for (index, element) in raw.iter().enumerate() {
            let sample = self
                .preprocessor
                .process(element, Some(self.info.input_size))
                .map_err(|source| PreprocessError::BatchElement {
                    index,
                    source: Box::new(source),
                })?;
            if sample.rows() != 1 {
                return Err(PreprocessError::NotSingleSample {
                    index,
                    rows: sample.rows(),
                }
                .into());
            }
            rows.push(sample.row(0).to_vec());
        }
        let batch = Tensor::from_rows(rows)?;
        Ok(self.model.infer(&batch)?)
    }

    /// Static description; no side effects.
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            model_info: self.info.clone(),
            supported_input_types: vec!["list", "nested_list", "mapping"],
            batch_support: true,
            device: self.info.device,
        }
    }
}
