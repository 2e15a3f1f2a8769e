//! Rectangular `[rows, cols]` f32 buffer, row-major.

use crate::error::PreprocessError;

#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl Tensor {
    /// One sample with a leading batch dimension of 1.
    pub fn single(row: Vec<f32>) -> Self {
        let cols = row.len();
        Self {
            data: row,
            rows: 1,
            cols,
        }
    }

    /// Stack rows into a rectangular batch; rejects ragged input.
    pub fn from_rows(rows: Vec<Vec<f32>>) -> Result<Self, PreprocessError> {
        if rows.is_empty() {
            return Err(PreprocessError::Empty);
        }
        let cols = rows[0].len();
        let n = rows.len();
        let mut data = Vec::with_capacity(n * cols);
        for (i, row) in rows.into_iter().enumerate() {
            if row.len() != cols {
                return Err(PreprocessError::Ragged {
                    expected: cols,
                    row: i,
                    got: row.len(),
                });
            }
            data.extend_from_slice(&row);
        }
        Ok(Self { data, rows: n, cols })
    }

    /// Wrap a flat row-major buffer; `data.len()` must be `rows * cols`.
    pub fn from_flat(data: Vec<f32>, rows: usize, cols: usize) -> Self {
        debug_assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> [usize; 2] {
        [self.rows, self.cols]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn row(&self, i: usize) -> &[f32] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Nested plain numbers, the JSON-facing representation.
    pub fn to_nested(&self) -> Vec<Vec<f32>> {
        (0..self.rows).map(|i| self.row(i).to_vec()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_adds_batch_dimension() {
        let t = Tensor::single(vec![1.0, 2.0, 3.0]);
        assert_eq!(t.shape(), [1, 3]);
        assert_eq!(t.row(0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn from_rows_rejects_ragged() {
        let err = Tensor::from_rows(vec![vec![1.0, 2.0], vec![3.0]]).unwrap_err();
        assert!(matches!(err, PreprocessError::Ragged { row: 1, got: 1, .. }));
    }

    #[test]
    fn from_rows_rejects_empty() {
        assert!(matches!(
            Tensor::from_rows(vec![]).unwrap_err(),
            PreprocessError::Empty
        ));
    }

    #[test]
    fn nested_round_trip() {
        let t = Tensor::from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(t.shape(), [2, 2]);
        assert_eq!(t.to_nested(), vec![vec![1.0, 2.0], vec![3.0, 4.0]]);
        assert_eq!(t.data(), &[1.0, 2.0, 3.0, 4.0]);
    }
}
