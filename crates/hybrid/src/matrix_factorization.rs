//! Matrix Factorization using Alternating Least Squares (ALS)
//!
//! Implements implicit-feedback ALS for collaborative filtering.
//! Decomposes the user-item interaction matrix into user and item latent factors.

use crate::error::{HybridError, Result};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// ALS configuration parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ALSConfig {
    /// Number of latent factors (embedding dimension)
    pub latent_factors: usize,
    /// Regularization parameter (lambda)
    pub regularization: f32,
    /// Number of iterations
    pub iterations: usize,
    /// Confidence scaling for implicit feedback
    pub alpha: f32,
    /// Seed for factor initialization
    pub seed: u64,
}

impl Default for ALSConfig {
    fn default() -> Self {
        Self {
            latent_factors: 32,
            regularization: 0.1,
            iterations: 15,
            alpha: 10.0,
            seed: 42,
        }
    }
}

/// Sparse user-item interaction matrix
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InteractionMatrix {
    /// (user_index, item_index) -> weight
    pub entries: BTreeMap<(usize, usize), f32>,
    pub num_users: usize,
    pub num_items: usize,
}

impl InteractionMatrix {
    pub fn with_shape(num_users: usize, num_items: usize) -> Self {
        Self {
            entries: BTreeMap::new(),
            num_users,
            num_items,
        }
    }

    pub fn insert(&mut self, user_idx: usize, item_idx: usize, value: f32) {
        self.entries.insert((user_idx, item_idx), value);
        self.num_users = self.num_users.max(user_idx + 1);
        self.num_items = self.num_items.max(item_idx + 1);
    }

    pub fn get(&self, user_idx: usize, item_idx: usize) -> f32 {
        *self.entries.get(&(user_idx, item_idx)).unwrap_or(&0.0)
    }

    pub fn contains(&self, user_idx: usize, item_idx: usize) -> bool {
        self.entries.contains_key(&(user_idx, item_idx))
    }

    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    /// Items of one user with their weights, in item index order
    pub fn user_items(&self, user_idx: usize) -> Vec<(usize, f32)> {
        self.entries
            .range((user_idx, 0)..(user_idx + 1, 0))
            .map(|(&(_, item_idx), &w)| (item_idx, w))
            .collect()
    }

    /// Per-user adjacency lists
    pub fn by_user(&self) -> Vec<Vec<(usize, f32)>> {
        let mut rows = vec![Vec::new(); self.num_users];
        for (&(u, i), &w) in &self.entries {
            rows[u].push((i, w));
        }
        rows
    }

    /// Per-item adjacency lists
    pub fn by_item(&self) -> Vec<Vec<(usize, f32)>> {
        let mut cols = vec![Vec::new(); self.num_items];
        for (&(u, i), &w) in &self.entries {
            cols[i].push((u, w));
        }
        cols
    }
}

/// ALS-based matrix factorization
#[derive(Debug, Clone)]
pub struct MatrixFactorization {
    config: ALSConfig,
    /// User latent factors: [num_users x latent_factors]
    pub user_factors: Option<Array2<f32>>,
    /// Item latent factors: [num_items x latent_factors]
    pub item_factors: Option<Array2<f32>>,
}

impl MatrixFactorization {
    pub fn new(config: ALSConfig) -> Self {
        Self {
            config,
            user_factors: None,
            item_factors: None,
        }
    }

    pub fn config(&self) -> &ALSConfig {
        &self.config
    }

    /// Train ALS model on sparse matrix
    pub fn fit(&mut self, matrix: &InteractionMatrix) -> Result<()> {
        if matrix.nnz() == 0 {
            return Err(HybridError::EmptyDataset(
                "interaction matrix has no entries".to_string(),
            ));
        }

        let k = self.config.latent_factors;
        let lambda = self.config.regularization as f64;
        let alpha = self.config.alpha;

        let mut rng = StdRng::seed_from_u64(self.config.seed);
        let mut user_factors = Array2::<f32>::zeros((matrix.num_users, k));
        let mut item_factors = Array2::<f32>::zeros((matrix.num_items, k));
        user_factors.mapv_inplace(|_| rng.gen_range(-0.1..0.1));
        item_factors.mapv_inplace(|_| rng.gen_range(-0.1..0.1));

        let by_user = matrix.by_user();
        let by_item = matrix.by_item();

        for iteration in 0..self.config.iterations {
            // Update user factors with item factors fixed
            let yty = Self::gram(&item_factors);
            for (u, user_items) in by_user.iter().enumerate() {
                if !user_items.is_empty() {
                    let x = self.solve_row(user_items, &item_factors, &yty, lambda, alpha)?;
                    user_factors.row_mut(u).assign(&x);
                }
            }

            // Update item factors with user factors fixed
            let xtx = Self::gram(&user_factors);
            for (i, item_users) in by_item.iter().enumerate() {
                if !item_users.is_empty() {
                    let y = self.solve_row(item_users, &user_factors, &xtx, lambda, alpha)?;
                    item_factors.row_mut(i).assign(&y);
                }
            }

            if iteration % 2 == 0 {
                let loss = Self::compute_loss(matrix, &user_factors, &item_factors, alpha);
                tracing::debug!("ALS iteration {}: loss = {:.4}", iteration, loss);
            }
        }

        self.user_factors = Some(user_factors);
        self.item_factors = Some(item_factors);

        Ok(())
    }

    /// Gram matrix FᵀF of a factor matrix, in f64
    fn gram(factors: &Array2<f32>) -> Array2<f64> {
        let f = factors.mapv(|v| v as f64);
        f.t().dot(&f)
    }

    /// Solve least squares system A * x = b using Cholesky decomposition
    /// For positive definite matrix A (which we guarantee by adding regularization)
    fn solve_least_squares(a: &Array2<f64>, b: &Array1<f64>) -> Result<Array1<f64>> {
        let n = a.nrows();

        // Perform Cholesky decomposition: A = L * L^T
        let mut l = Array2::<f64>::zeros((n, n));

        for i in 0..n {
            for j in 0..=i {
                let mut sum = 0.0;
                for k in 0..j {
                    sum += l[[i, k]] * l[[j, k]];
                }

                if i == j {
                    let diag = a[[i, i]] - sum;
                    if diag <= 0.0 {
                        return Err(HybridError::Solver(
                            "matrix is not positive definite".to_string(),
                        ));
                    }
                    l[[i, j]] = diag.sqrt();
                } else {
                    l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
                }
            }
        }

        // Forward substitution: L * y = b
        let mut y = Array1::<f64>::zeros(n);
        for i in 0..n {
            let mut sum = 0.0;
            for j in 0..i {
                sum += l[[i, j]] * y[j];
            }
            y[i] = (b[i] - sum) / l[[i, i]];
        }

        // Backward substitution: L^T * x = y
        let mut x = Array1::<f64>::zeros(n);
        for i in (0..n).rev() {
            let mut sum = 0.0;
            for j in (i + 1)..n {
                sum += l[[j, i]] * x[j];
            }
            x[i] = (y[i] - sum) / l[[i, i]];
        }

        Ok(x)
    }

    /// Solve one row of factors given the fixed side.
    ///
    /// A = FᵀF + Σ (c - 1) f fᵀ + λI, b = Σ c f, with c = 1 + alpha * weight
    /// over the observed entries and preference 1.
    fn solve_row(
        &self,
        observed: &[(usize, f32)],
        fixed: &Array2<f32>,
        gram: &Array2<f64>,
        lambda: f64,
        alpha: f32,
    ) -> Result<Array1<f32>> {
        let k = self.config.latent_factors;
        let mut a = gram.clone();
        let mut b = Array1::<f64>::zeros(k);

        for &(idx, weight) in observed {
            let vec = fixed.row(idx);
            let confidence = (1.0 + alpha * weight) as f64;

            for i in 0..k {
                let vi = vec[i] as f64;
                for j in 0..k {
                    a[[i, j]] += (confidence - 1.0) * vi * vec[j] as f64;
                }
                b[i] += confidence * vi;
            }
        }

        // Add regularization: A += lambda * I
        for i in 0..k {
            a[[i, i]] += lambda;
        }

        let x = Self::solve_least_squares(&a, &b)?;
        Ok(x.mapv(|v| v as f32))
    }

    /// Confidence-weighted reconstruction loss over observed entries
    fn compute_loss(
        matrix: &InteractionMatrix,
        user_factors: &Array2<f32>,
        item_factors: &Array2<f32>,
        alpha: f32,
    ) -> f32 {
        let mut loss = 0.0;
        let mut count = 0;

        for (&(u, i), &weight) in &matrix.entries {
            let prediction = user_factors.row(u).dot(&item_factors.row(i));
            loss += (1.0 + alpha * weight) * (1.0 - prediction).powi(2);
            count += 1;
        }

        if count > 0 {
            loss / count as f32
        } else {
            0.0
        }
    }

    /// Predict affinity for a user-item index pair
    pub fn predict(&self, user_idx: usize, item_idx: usize) -> Result<f32> {
        let user_factors = self.user_factors.as_ref().ok_or(HybridError::NotTrained)?;
        let item_factors = self.item_factors.as_ref().ok_or(HybridError::NotTrained)?;

        if user_idx >= user_factors.nrows() {
            return Err(HybridError::UnknownInternalIndex {
                space: "user",
                index: user_idx,
            });
        }
        if item_idx >= item_factors.nrows() {
            return Err(HybridError::UnknownInternalIndex {
                space: "item",
                index: item_idx,
            });
        }

        Ok(user_factors.row(user_idx).dot(&item_factors.row(item_idx)))
    }

    /// Get user embedding
    pub fn user_embedding(&self, user_idx: usize) -> Result<Vec<f32>> {
        let user_factors = self.user_factors.as_ref().ok_or(HybridError::NotTrained)?;
        if user_idx >= user_factors.nrows() {
            return Err(HybridError::UnknownInternalIndex {
                space: "user",
                index: user_idx,
            });
        }
        Ok(user_factors.row(user_idx).to_vec())
    }

    /// Get item embedding
    pub fn item_embedding(&self, item_idx: usize) -> Result<Vec<f32>> {
        let item_factors = self.item_factors.as_ref().ok_or(HybridError::NotTrained)?;
        if item_idx >= item_factors.nrows() {
            return Err(HybridError::UnknownInternalIndex {
                space: "item",
                index: item_idx,
            });
        }
        Ok(item_factors.row(item_idx).to_vec())
    }

    /// Compute cosine similarity between two embeddings
    pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        if a.len() != b.len() {
            return 0.0;
        }

        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> ALSConfig {
        ALSConfig {
            latent_factors: 4,
            regularization: 0.1,
            iterations: 10,
            alpha: 10.0,
            seed: 7,
        }
    }

    /// Two disjoint taste groups: users 0,1 on items 0,1 and users 2,3 on items 2,3
    fn block_matrix() -> InteractionMatrix {
        let mut matrix = InteractionMatrix::with_shape(4, 4);
        for (u, i) in [(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (2, 3), (3, 2), (3, 3)] {
            matrix.insert(u, i, 1.0);
        }
        matrix
    }

    #[test]
    fn test_interaction_matrix() {
        let mut matrix = InteractionMatrix::default();
        matrix.insert(0, 0, 1.0);
        matrix.insert(0, 1, 2.0);
        matrix.insert(1, 0, 3.0);

        assert_eq!(matrix.num_users, 2);
        assert_eq!(matrix.num_items, 2);
        assert_eq!(matrix.get(0, 0), 1.0);
        assert_eq!(matrix.get(0, 1), 2.0);
        assert_eq!(matrix.get(1, 0), 3.0);
        assert_eq!(matrix.get(1, 1), 0.0);
        assert!(!matrix.contains(1, 1));
    }

    #[test]
    fn test_adjacency_lists() {
        let mut matrix = InteractionMatrix::with_shape(3, 3);
        matrix.insert(0, 2, 1.0);
        matrix.insert(0, 0, 2.0);
        matrix.insert(2, 0, 3.0);

        assert_eq!(matrix.user_items(0), vec![(0, 2.0), (2, 1.0)]);
        assert!(matrix.user_items(1).is_empty());

        let by_user = matrix.by_user();
        assert_eq!(by_user.len(), 3);
        assert_eq!(by_user[2], vec![(0, 3.0)]);

        let by_item = matrix.by_item();
        assert_eq!(by_item[0], vec![(0, 2.0), (2, 3.0)]);
        assert!(by_item[1].is_empty());
    }

    #[test]
    fn test_als_fit() {
        let mut mf = MatrixFactorization::new(small_config());
        mf.fit(&block_matrix()).unwrap();

        let user_factors = mf.user_factors.as_ref().unwrap();
        let item_factors = mf.item_factors.as_ref().unwrap();

        assert_eq!(user_factors.nrows(), 4);
        assert_eq!(user_factors.ncols(), 4);
        assert_eq!(item_factors.nrows(), 4);
        assert_eq!(item_factors.ncols(), 4);
    }

    #[test]
    fn test_fit_empty_matrix() {
        let mut mf = MatrixFactorization::new(small_config());
        let result = mf.fit(&InteractionMatrix::with_shape(2, 2));
        assert!(matches!(result, Err(HybridError::EmptyDataset(_))));
    }

    #[test]
    fn test_predict_prefers_own_group() {
        let mut mf = MatrixFactorization::new(small_config());
        mf.fit(&block_matrix()).unwrap();

        let seen = mf.predict(0, 0).unwrap();
        let other_group = mf.predict(0, 2).unwrap();
        assert!(seen > other_group);
        assert!(seen > 0.5);
    }

    #[test]
    fn test_seeded_fit_is_reproducible() {
        let mut a = MatrixFactorization::new(small_config());
        let mut b = MatrixFactorization::new(small_config());
        a.fit(&block_matrix()).unwrap();
        b.fit(&block_matrix()).unwrap();

        assert_eq!(a.user_factors, b.user_factors);
        assert_eq!(a.item_factors, b.item_factors);
    }

    #[test]
    fn test_get_embeddings() {
        let mut mf = MatrixFactorization::new(small_config());
        mf.fit(&block_matrix()).unwrap();

        assert_eq!(mf.user_embedding(0).unwrap().len(), 4);
        assert_eq!(mf.item_embedding(3).unwrap().len(), 4);
        assert!(mf.item_embedding(4).is_err());
    }

    #[test]
    fn test_untrained_and_out_of_range() {
        let mf = MatrixFactorization::new(small_config());
        assert!(matches!(mf.predict(0, 0), Err(HybridError::NotTrained)));

        let mut mf = MatrixFactorization::new(small_config());
        mf.fit(&block_matrix()).unwrap();
        assert!(matches!(
            mf.predict(9, 0),
            Err(HybridError::UnknownInternalIndex { space: "user", .. })
        ));
        assert!(matches!(
            mf.predict(0, 9),
            Err(HybridError::UnknownInternalIndex { space: "item", .. })
        ));
    }

    #[test]
    fn test_cosine_similarity() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!((MatrixFactorization::cosine_similarity(&a, &b) - 1.0).abs() < 1e-6);

        let c = vec![1.0, 0.0, 0.0];
        let d = vec![0.0, 1.0, 0.0];
        assert!((MatrixFactorization::cosine_similarity(&c, &d) - 0.0).abs() < 1e-6);

        assert_eq!(MatrixFactorization::cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
    }
}
