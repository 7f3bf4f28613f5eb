//! Sparse row-major item feature matrix

use ndarray::{Array1, ArrayView1};

/// Sparse matrix stored as one `(column, value)` list per row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeatureMatrix {
    rows: Vec<Vec<(usize, f32)>>,
    num_features: usize,
}

impl FeatureMatrix {
    pub fn new(num_features: usize) -> Self {
        Self {
            rows: Vec::new(),
            num_features,
        }
    }

    /// Append a row; entries are sorted by column and zeros are dropped
    pub fn push_row(&mut self, mut entries: Vec<(usize, f32)>) {
        entries.retain(|&(col, value)| value != 0.0 && col < self.num_features);
        entries.sort_by_key(|&(col, _)| col);
        self.rows.push(entries);
    }

    pub fn nrows(&self) -> usize {
        self.rows.len()
    }

    pub fn ncols(&self) -> usize {
        self.num_features
    }

    pub fn nnz(&self) -> usize {
        self.rows.iter().map(Vec::len).sum()
    }

    pub fn row(&self, idx: usize) -> Option<&[(usize, f32)]> {
        self.rows.get(idx).map(Vec::as_slice)
    }

    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.row(row)
            .and_then(|entries| entries.iter().find(|&&(c, _)| c == col))
            .map(|&(_, value)| value)
            .unwrap_or(0.0)
    }

    /// New matrix whose row `i` is row `order[i]` of this one.
    ///
    /// Returns `None` when `order` references a row that does not exist.
    pub fn select_rows(&self, order: &[usize]) -> Option<FeatureMatrix> {
        let mut rows = Vec::with_capacity(order.len());
        for &idx in order {
            rows.push(self.rows.get(idx)?.clone());
        }
        Some(FeatureMatrix {
            rows,
            num_features: self.num_features,
        })
    }

    /// Dot product of a row with a dense vector of length `ncols()`
    pub fn row_dot(&self, row: usize, dense: ArrayView1<f32>) -> f32 {
        self.row(row)
            .map(|entries| entries.iter().map(|&(col, value)| value * dense[col]).sum())
            .unwrap_or(0.0)
    }

    /// Add `weight * row` into a dense accumulator
    pub fn add_row_scaled(&self, row: usize, weight: f32, acc: &mut Array1<f32>) {
        if let Some(entries) = self.row(row) {
            for &(col, value) in entries {
                acc[col] += weight * value;
            }
        }
    }
}
