//! ONNX artifact loading and forward computation via tract.

use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, info};
use tract_onnx::prelude::*;

use crate::error::{InferenceError, LoadError};
use crate::tensor::Tensor;

/// Compute placement, resolved once at load time and fixed for the process
/// lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Accelerator,
}

impl Device {
    /// tract executes on the host CPU; no accelerator backend is wired in,
    /// so detection currently always resolves to `Cpu`.
    pub fn detect() -> Self {
        Device::Cpu
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => f.write_str("cpu"),
            Device::Accelerator => f.write_str("accelerator"),
        }
    }
}

/// Static description of a loaded artifact.
#[derive(Debug, Clone, Serialize)]
pub struct ModelInfo {
    pub input_size: usize,
    pub device: Device,
    pub model_type: String,
    pub parameters: usize,
}

/// Seam between the prediction service and the loaded artifact; tests
/// substitute a stub implementation.
pub trait ForwardModel: Send + Sync {
    fn infer(&self, input: &Tensor) -> Result<Tensor, InferenceError>;
    fn describe(&self) -> ModelInfo;
}

/// A pre-trained model loaded from disk. Immutable after load; inference is
/// a pure function of the input, so one handle is shared across requests
/// without locking.
#[derive(Debug)]
pub struct OnnxArtifact {
    plan: TypedRunnableModel<TypedModel>,
    info: ModelInfo,
}

impl OnnxArtifact {
    /// Loads and optimizes the artifact, derives its metadata and proves it
    /// can run a forward pass. Any failure here is fatal to startup.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        std::fs::metadata(path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => LoadError::NotFound {
                path: path.to_path_buf(),
            },
            _ => LoadError::Io {
                path: path.to_path_buf(),
                source,
            },
        })?;

        let typed = tract_onnx::onnx()
            .model_for_path(path)
            .and_then(|m| m.into_optimized())
            .map_err(|e| LoadError::NotRunnable {
                reason: format!("{e:#}"),
            })?;

        let input_size = typed
            .input_fact(0)
            .ok()
            .and_then(|fact| fact.shape.as_concrete().and_then(|dims| dims.last().copied()))
            .ok_or_else(|| LoadError::NotRunnable {
                reason: "input dimensionality is not concrete".into(),
            })?;

        // Weights live in constant outlets of the optimized graph.
        let parameters: usize = typed
            .nodes
            .iter()
            .flat_map(|node| node.outputs.iter())
            .filter_map(|outlet| outlet.fact.konst.as_ref())
            .map(|tensor| tensor.len())
            .sum();
        let node_count = typed.nodes.len();

        let plan = typed.into_runnable().map_err(|e| LoadError::NotRunnable {
            reason: format!("{e:#}"),
        })?;

        let artifact = Self {
            plan,
            info: ModelInfo {
                input_size,
                device: Device::detect(),
                model_type: "onnx".into(),
                parameters,
            },
        };
        artifact.log_summary(path, node_count);
        artifact.warmup()?;
        Ok(artifact)
    }

    fn log_summary(&self, path: &Path, node_count: usize) {
        info!(
            path = %path.display(),
            input_size = self.info.input_size,
            parameters = self.info.parameters,
            nodes = node_count,
            device = %self.info.device,
            "model artifact loaded"
        );
        for node in self.plan.model().nodes.iter() {
            debug!(node = %node.name, op = %node.op.name(), "model node");
        }
    }

    /// One zero-filled inference at load time; verifies the deserialized
    /// graph is actually invokable before the service goes live.
    fn warmup(&self) -> Result<(), LoadError> {
        let zeros = Tensor::single(vec![0.0; self.info.input_size]);
        self.run(&zeros)
            .map(|_| ())
            .map_err(|e| LoadError::NotRunnable {
                reason: e.to_string(),
            })
    }

    fn run(&self, input: &Tensor) -> Result<Tensor, InferenceError> {
        let tract_input =
            tract_onnx::prelude::Tensor::from_shape(&[input.rows(), input.cols()], input.data())
                .map_err(|e| InferenceError::Forward(format!("{e:#}")))?;
        let outputs = self
            .plan
            .run(tvec!(tract_input.into()))
            .map_err(|e| InferenceError::Forward(format!("{e:#}")))?;
        let output = outputs
            .first()
            .ok_or_else(|| InferenceError::Output("model produced no outputs".into()))?;
        let view = output
            .to_array_view::<f32>()
            .map_err(|e| InferenceError::Output(format!("{e:#}")))?;
        let (rows, cols) = output_dims(view.shape(), input.rows())?;
        Ok(Tensor::from_flat(view.iter().copied().collect(), rows, cols))
    }
}

/// Maps a raw output shape onto `[rows, cols]` so rows keep a one-to-one
/// correspondence with batch inputs. A rank-1 output of batch length is a
/// squeezed per-sample scalar head; for a single input a rank-1 output is
/// one row of scores. Anything else cannot be split per input.
fn output_dims(dims: &[usize], batch: usize) -> Result<(usize, usize), InferenceError> {
    match dims {
        [r, c] => Ok((*r, *c)),
        [n] if *n == batch => Ok((batch, 1)),
        [n] if batch == 1 => Ok((1, *n)),
        other => Err(InferenceError::Output(format!(
            "cannot split output of shape {other:?} across a batch of {batch}"
        ))),
    }
}

impl ForwardModel for OnnxArtifact {
    fn infer(&self, input: &Tensor) -> Result<Tensor, InferenceError> {
        self.run(input)
    }

    fn describe(&self) -> ModelInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_resolves_once_to_cpu() {
        assert_eq!(Device::detect(), Device::Cpu);
        assert_eq!(Device::detect().to_string(), "cpu");
    }

    #[test]
    fn model_info_serializes_lowercase_device() {
        let info = ModelInfo {
            input_size: 8,
            device: Device::Cpu,
            model_type: "onnx".into(),
            parameters: 42,
        };
        let v = serde_json::to_value(&info).unwrap();
        assert_eq!(v["device"], "cpu");
        assert_eq!(v["input_size"], 8);
    }

    #[test]
    fn rank_two_output_passes_through() {
        assert_eq!(output_dims(&[3, 2], 3).unwrap(), (3, 2));
        assert_eq!(output_dims(&[1, 1], 1).unwrap(), (1, 1));
    }

    #[test]
    fn squeezed_output_splits_one_row_per_batch_input() {
        // A sigmoid head squeezed to [N] must come back as N rows, not one
        // N-wide row.
        assert_eq!(output_dims(&[3], 3).unwrap(), (3, 1));
        assert_eq!(output_dims(&[1], 1).unwrap(), (1, 1));
    }

    #[test]
    fn rank_one_output_for_single_input_is_one_row_of_scores() {
        assert_eq!(output_dims(&[2], 1).unwrap(), (1, 2));
    }

    #[test]
    fn unsplittable_output_shapes_are_errors() {
        assert!(matches!(
            output_dims(&[4], 3),
            Err(InferenceError::Output(_))
        ));
        assert!(matches!(
            output_dims(&[2, 3, 4], 2),
            Err(InferenceError::Output(_))
        ));
        assert!(matches!(output_dims(&[], 1), Err(InferenceError::Output(_))));
    }

    #[test]
    fn missing_artifact_is_a_load_error() {
        let err = OnnxArtifact::load(Path::new("does/not/exist.onnx")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }
}
