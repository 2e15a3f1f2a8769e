//! End-to-end flow through the public API with a stub model: the same seam
//! the HTTP layer uses, no artifact file required.

use std::sync::Arc;

use sentinel_core::{
    Device, ForwardModel, InferenceError, ModelInfo, PredictionService, Tensor,
};
use serde_json::json;

/// Weighted sum per row, shape [rows, 1].
struct LinearStub {
    weights: Vec<f32>,
}

impl ForwardModel for LinearStub {
    fn infer(&self, input: &Tensor) -> Result<Tensor, InferenceError> {
        let rows = (0..input.rows())
            .map(|i| {
                let score = input
                    .row(i)
                    .iter()
                    .zip(self.weights.iter())
                    .map(|(x, w)| x * w)
                    .sum::<f32>();
                vec![score]
            })
            .collect();
        Tensor::from_rows(rows).map_err(|e| InferenceError::Output(e.to_string()))
    }

    fn describe(&self) -> ModelInfo {
        ModelInfo {
            input_size: self.weights.len(),
            device: Device::Cpu,
            model_type: "stub".into(),
            parameters: self.weights.len(),
        }
    }
}

fn service() -> PredictionService {
    PredictionService::new(Arc::new(LinearStub {
        weights: vec![1.0, -1.0, 0.5],
    }))
}

#[test]
fn list_mapping_and_features_inputs_agree() {
    let svc = service();
    let from_list = svc.predict(&json!([1.0, 2.0, 4.0]));
    let from_map = svc.predict(&json!({"a": 1.0, "b": 2.0, "c": 4.0}));
    let from_features = svc.predict(&json!({"features": [1.0, 2.0, 4.0]}));
    assert!(from_list.success && from_map.success && from_features.success);
    assert_eq!(from_list.prediction, from_map.prediction);
    assert_eq!(from_list.prediction, from_features.prediction);
    assert_eq!(from_list.prediction, Some(vec![vec![1.0]]));
}

#[test]
fn capabilities_round_trip_through_json() {
    let caps = service().capabilities();
    let v = serde_json::to_value(&caps).unwrap();
    assert_eq!(v["model_info"]["input_size"], 3);
    assert_eq!(v["device"], "cpu");
    assert_eq!(v["batch_support"], true);
    assert!(v["supported_input_types"].is_array());
}

#[test]
fn batch_order_is_preserved() {
    let result = service().predict_batch(&[
        json!([1.0, 0.0, 0.0]),
        json!([0.0, 1.0, 0.0]),
        json!([0.0, 0.0, 1.0]),
    ]);
    assert!(result.success);
    let preds = result.predictions.unwrap();
    assert_eq!(preds, vec![vec![1.0], vec![-1.0], vec![0.5]]);
    assert_eq!(result.batch_size, Some(3));
}

#[test]
fn empty_batch_fails_whole() {
    let result = service().predict_batch(&[]);
    assert!(!result.success);
    assert!(result.error.is_some());
}
