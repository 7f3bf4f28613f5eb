//! Hybrid collaborative + content scoring
//!
//! Blends the ALS affinity of a user-item pair with the cosine similarity
//! between the item's TF-IDF genre vector and the user's content profile.

use crate::error::{HybridError, Result};
use crate::features::FeatureMatrix;
use crate::matrix_factorization::{ALSConfig, InteractionMatrix, MatrixFactorization};
use ndarray::{Array1, Array2};

/// Content weight used when none is configured
pub const DEFAULT_CONTENT_WEIGHT: f32 = 0.3;

#[derive(Debug, Clone)]
pub struct HybridModel {
    als: MatrixFactorization,
    content_weight: f32,
    item_features: Option<FeatureMatrix>,
    /// One L2-normalized content profile per user: [num_users x num_features]
    user_profiles: Option<Array2<f32>>,
}

impl HybridModel {
    pub fn new(als_config: ALSConfig, content_weight: f32) -> Self {
        Self {
            als: MatrixFactorization::new(als_config),
            content_weight: content_weight.clamp(0.0, 1.0),
            item_features: None,
            user_profiles: None,
        }
    }

    /// Collaborative factor model underneath the blend
    pub fn als(&self) -> &MatrixFactorization {
        &self.als
    }

    pub fn content_weight(&self) -> f32 {
        self.content_weight
    }

    pub fn num_items(&self) -> usize {
        self.item_features.as_ref().map(FeatureMatrix::nrows).unwrap_or(0)
    }

    pub fn num_users(&self) -> usize {
        self.user_profiles.as_ref().map(|p| p.nrows()).unwrap_or(0)
    }

    /// Train on interactions with item features aligned to the item index space
    pub fn fit(
        &mut self,
        interactions: &InteractionMatrix,
        item_features: FeatureMatrix,
    ) -> Result<()> {
        if item_features.nrows() != interactions.num_items {
            return Err(HybridError::FeatureMisaligned {
                expected: interactions.num_items,
                actual: item_features.nrows(),
            });
        }

        tracing::info!(
            "Training hybrid model: {} users, {} items, {} interactions, {} features, content weight {:.2}",
            interactions.num_users,
            interactions.num_items,
            interactions.nnz(),
            item_features.ncols(),
            self.content_weight
        );

        self.als.fit(interactions)?;
        self.user_profiles = Some(Self::build_profiles(interactions, &item_features));
        self.item_features = Some(item_features);

        Ok(())
    }

    /// Rating-weighted sum of each user's item feature rows, L2-normalized
    fn build_profiles(interactions: &InteractionMatrix, features: &FeatureMatrix) -> Array2<f32> {
        let mut profiles = Array2::<f32>::zeros((interactions.num_users, features.ncols()));

        for (u, items) in interactions.by_user().iter().enumerate() {
            let mut acc = Array1::<f32>::zeros(features.ncols());
            for &(i, weight) in items {
                features.add_row_scaled(i, weight, &mut acc);
            }

            let norm = acc.dot(&acc).sqrt();
            if norm > 0.0 {
                acc /= norm;
            }
            profiles.row_mut(u).assign(&acc);
        }

        profiles
    }

    /// Score the given items for one user
    pub fn predict(&self, user_idx: usize, item_indices: &[usize]) -> Result<Vec<f32>> {
        let features = self.item_features.as_ref().ok_or(HybridError::NotTrained)?;
        let profiles = self.user_profiles.as_ref().ok_or(HybridError::NotTrained)?;

        if user_idx >= profiles.nrows() {
            return Err(HybridError::UnknownInternalIndex {
                space: "user",
                index: user_idx,
            });
        }
        let profile = profiles.row(user_idx);

        item_indices
            .iter()
            .map(|&item_idx| {
                if item_idx >= features.nrows() {
                    return Err(HybridError::UnknownInternalIndex {
                        space: "item",
                        index: item_idx,
                    });
                }

                let collaborative = if self.content_weight < 1.0 {
                    self.als.predict(user_idx, item_idx)?
                } else {
                    0.0
                };
                let content = features.row_dot(item_idx, profile);

                Ok((1.0 - self.content_weight) * collaborative + self.content_weight * content)
            })
            .collect()
    }

    /// Score every item for one user, in item index order
    pub fn predict_all(&self, user_idx: usize) -> Result<Vec<f32>> {
        let items: Vec<usize> = (0..self.num_items()).collect();
        self.predict(user_idx, &items)
    }
}
