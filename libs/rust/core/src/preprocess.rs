//! Coercion of JSON-compatible request input into model-ready tensors.

use serde_json::{Map, Value};
use tracing::warn;

use crate::error::PreprocessError;
use crate::tensor::Tensor;

/// Normalizes heterogeneous input (flat list, nested list for a batch, or a
/// mapping of named features) into a `[batch, features]` tensor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Preprocessor;

impl Preprocessor {
    pub fn new() -> Self {
        Self
    }

    /// A one-dimensional result gains a leading batch dimension of size 1.
    /// When `expected_size` is known and the trailing dimension differs, the
    /// mismatch is logged and the tensor passed through unmodified; no
    /// padding or truncation is performed.
    pub fn process(
        &self,
        raw: &Value,
        expected_size: Option<usize>,
    ) -> Result<Tensor, PreprocessError> {
        let tensor = match raw {
            Value::Object(map) => mapping_to_tensor(map)?,
            Value::Array(items) => array_to_tensor(items)?,
            Value::Number(_) => return Err(PreprocessError::UnsupportedType("number")),
            Value::String(_) => return Err(PreprocessError::UnsupportedType("string")),
            Value::Bool(_) => return Err(PreprocessError::UnsupportedType("bool")),
            Value::Null => return Err(PreprocessError::UnsupportedType("null")),
        };
        if let Some(expected) = expected_size {
            if tensor.cols() != expected {
                warn!(
                    shape = ?tensor.shape(),
                    expected,
                    "input shape does not match the model's expected size"
                );
            }
        }
        Ok(tensor)
    }
}

/// A `features` key wins; otherwise all values of the mapping are taken in
/// document order (serde_json is built with `preserve_order`).
fn mapping_to_tensor(map: &Map<String, Value>) -> Result<Tensor, PreprocessError> {
    if let Some(features) = map.get("features") {
        return match features {
            Value::Array(items) => array_to_tensor(items),
            _ => Err(PreprocessError::UnsupportedType("non-list features")),
        };
    }
    let row = numeric_row(map.values())?;
    if row.is_empty() {
        return Err(PreprocessError::Empty);
    }
    Ok(Tensor::single(row))
}

/// The first element decides: nested arrays become batch rows, anything else
/// is read as one flat sample.
fn array_to_tensor(items: &[Value]) -> Result<Tensor, PreprocessError> {
    if items.is_empty() {
        return Err(PreprocessError::Empty);
    }
    if items[0].is_array() {
        let mut rows = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Array(inner) => rows.push(numeric_row(inner.iter())?),
                _ => return Err(PreprocessError::UnsupportedType("mixed nesting")),
            }
        }
        Tensor::from_rows(rows)
    } else {
        numeric_row(items.iter()).map(Tensor::single)
    }
}

fn numeric_row<'a>(
    values: impl Iterator<Item = &'a Value>,
) -> Result<Vec<f32>, PreprocessError> {
    let mut row = Vec::new();
    for (index, value) in values.enumerate() {
        match value.as_f64() {
            Some(x) => row.push(x as f32),
            None => return Err(PreprocessError::NonNumeric { index }),
        }
    }
    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flat_list_becomes_single_sample() {
        let t = Preprocessor::new()
            .process(&json!([0.1, 0.2, 0.3, 0.4]), Some(4))
            .unwrap();
        assert_eq!(t.shape(), [1, 4]);
    }

    #[test]
    fn nested_list_becomes_batch() {
        let t = Preprocessor::new()
            .process(&json!([[1, 2], [3, 4], [5, 6]]), Some(2))
            .unwrap();
        assert_eq!(t.shape(), [3, 2]);
        assert_eq!(t.row(2), &[5.0, 6.0]);
    }

    #[test]
    fn mapping_prefers_features_key() {
        let t = Preprocessor::new()
            .process(&json!({"features": [1.0, 2.0], "other": 99}), None)
            .unwrap();
        assert_eq!(t.shape(), [1, 2]);
        assert_eq!(t.row(0), &[1.0, 2.0]);
    }

    #[test]
    fn mapping_without_features_uses_document_order() {
        let t = Preprocessor::new()
            .process(&json!({"z": 1.0, "a": 2.0, "m": 3.0}), None)
            .unwrap();
        // preserve_order keeps JSON document order, not alphabetical order.
        assert_eq!(t.row(0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn non_numeric_mapping_value_fails() {
        let err = Preprocessor::new()
            .process(&json!({"a": 1.0, "b": "nope"}), None)
            .unwrap_err();
        assert!(matches!(err, PreprocessError::NonNumeric { index: 1 }));
    }

    #[test]
    fn scalar_and_null_are_unsupported() {
        let p = Preprocessor::new();
        assert!(p.process(&json!(3.5), None).is_err());
        assert!(p.process(&Value::Null, None).is_err());
        assert!(p.process(&json!("text"), None).is_err());
    }

    #[test]
    fn ragged_batch_fails() {
        let err = Preprocessor::new()
            .process(&json!([[1, 2, 3], [4, 5]]), None)
            .unwrap_err();
        assert!(matches!(err, PreprocessError::Ragged { .. }));
    }

    #[test]
    fn size_mismatch_passes_through_unmodified() {
        // Policy: warn but do not pad or truncate.
        let t = Preprocessor::new()
            .process(&json!([1.0, 2.0]), Some(10))
            .unwrap();
        assert_eq!(t.shape(), [1, 2]);
    }
}
