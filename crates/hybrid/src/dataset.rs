//! Identifier mappings and matrix construction
//!
//! Assigns every distinct external user and movie id a dense internal index
//! and builds the interaction and item feature matrices in that index space.

use crate::error::{HybridError, Result};
use crate::features::FeatureMatrix;
use crate::matrix_factorization::InteractionMatrix;
use crate::types::{MovieId, UserId};
use std::collections::HashMap;
use std::hash::Hash;

/// Bijective mapping between external ids and dense zero-based indices.
///
/// Indices follow order of first appearance.
#[derive(Debug, Clone)]
pub struct IdMapping<K> {
    forward: HashMap<K, usize>,
    reverse: Vec<K>,
}

impl<K> IdMapping<K>
where
    K: Eq + Hash + Clone,
{
    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = K>,
    {
        let mut forward = HashMap::new();
        let mut reverse = Vec::new();

        for id in ids {
            forward.entry(id.clone()).or_insert_with(|| {
                reverse.push(id);
                reverse.len() - 1
            });
        }

        Self { forward, reverse }
    }

    pub fn index_of(&self, id: &K) -> Option<usize> {
        self.forward.get(id).copied()
    }

    pub fn external_id(&self, index: usize) -> Option<&K> {
        self.reverse.get(index)
    }

    pub fn contains(&self, id: &K) -> bool {
        self.forward.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.reverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reverse.is_empty()
    }

    /// External ids in internal index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &K)> {
        self.reverse.iter().enumerate()
    }
}

/// User and item index spaces for one training run
#[derive(Debug, Clone)]
pub struct Dataset {
    pub user_map: IdMapping<UserId>,
    pub item_map: IdMapping<MovieId>,
}

impl Dataset {
    pub fn fit<U, I>(user_ids: U, item_ids: I) -> Self
    where
        U: IntoIterator<Item = UserId>,
        I: IntoIterator<Item = MovieId>,
    {
        let dataset = Self {
            user_map: IdMapping::from_ids(user_ids),
            item_map: IdMapping::from_ids(item_ids),
        };

        tracing::info!(
            "Dataset fitted: {} users, {} items",
            dataset.num_users(),
            dataset.num_items()
        );

        dataset
    }

    pub fn num_users(&self) -> usize {
        self.user_map.len()
    }

    pub fn num_items(&self) -> usize {
        self.item_map.len()
    }

    /// Build the weighted interaction matrix from `(user, movie, weight)` triples
    pub fn build_interactions<T>(&self, triples: T) -> Result<InteractionMatrix>
    where
        T: IntoIterator<Item = (UserId, MovieId, f32)>,
    {
        let mut matrix = InteractionMatrix::with_shape(self.num_users(), self.num_items());

        for (user_id, movie_id, weight) in triples {
            let user_idx = self
                .user_map
                .index_of(&user_id)
                .ok_or(HybridError::UnknownUser(user_id))?;
            let item_idx = self
                .item_map
                .index_of(&movie_id)
                .ok_or(HybridError::UnknownMovie(movie_id))?;

            matrix.insert(user_idx, item_idx, weight);
        }

        tracing::info!(
            "Built interaction matrix {}x{} with {} entries",
            matrix.num_users,
            matrix.num_items,
            matrix.nnz()
        );

        Ok(matrix)
    }

    /// Reorder feature rows so that row `i` belongs to the item with internal index `i`.
    ///
    /// `row_of` gives the row of each movie in `features`. Every mapped item
    /// must have a row.
    pub fn align_item_features(
        &self,
        features: &FeatureMatrix,
        row_of: &HashMap<MovieId, usize>,
    ) -> Result<FeatureMatrix> {
        let mut order = Vec::with_capacity(self.num_items());
        for (_, movie_id) in self.item_map.iter() {
            let row = row_of
                .get(movie_id)
                .copied()
                .ok_or(HybridError::MissingItemFeatures(*movie_id))?;
            order.push(row);
        }

        let aligned = features
            .select_rows(&order)
            .ok_or(HybridError::FeatureMisaligned {
                expected: self.num_items(),
                actual: features.nrows(),
            })?;

        tracing::debug!(
            "Aligned {} feature rows to item index order",
            aligned.nrows()
        );

        Ok(aligned)
    }
}
