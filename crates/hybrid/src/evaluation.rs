//! Offline evaluation: random train/test split, precision@k and AUC

use crate::error::{HybridError, Result};
use crate::hybrid::HybridModel;
use crate::matrix_factorization::InteractionMatrix;
use crate::ranking::top_n_excluding;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::collections::HashSet;

/// Randomly split observed interactions into train and test matrices of the same shape
pub fn train_test_split(
    interactions: &InteractionMatrix,
    test_fraction: f32,
    seed: u64,
) -> Result<(InteractionMatrix, InteractionMatrix)> {
    if !(0.0..=1.0).contains(&test_fraction) {
        return Err(HybridError::Config(format!(
            "test_fraction must be within [0, 1], got {}",
            test_fraction
        )));
    }

    let mut entries: Vec<((usize, usize), f32)> =
        interactions.entries.iter().map(|(&k, &v)| (k, v)).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    entries.shuffle(&mut rng);

    let cutoff = (entries.len() as f32 * test_fraction).round() as usize;

    let mut train = InteractionMatrix::with_shape(interactions.num_users, interactions.num_items);
    let mut test = InteractionMatrix::with_shape(interactions.num_users, interactions.num_items);
    for (pos, ((u, i), w)) in entries.into_iter().enumerate() {
        if pos < cutoff {
            test.insert(u, i, w);
        } else {
            train.insert(u, i, w);
        }
    }

    tracing::debug!(
        "Split {} interactions into {} train / {} test",
        interactions.nnz(),
        train.nnz(),
        test.nnz()
    );

    Ok((train, test))
}

fn known_items(matrix: Option<&InteractionMatrix>, user_idx: usize) -> HashSet<usize> {
    matrix
        .map(|m| m.user_items(user_idx).into_iter().map(|(i, _)| i).collect())
        .unwrap_or_default()
}

/// Mean fraction of each user's top `k` that appears in `test`.
///
/// Users without test interactions are skipped; `train` pairs are excluded
/// from the ranking when given.
pub fn precision_at_k(
    model: &HybridModel,
    test: &InteractionMatrix,
    train: Option<&InteractionMatrix>,
    k: usize,
) -> Result<f32> {
    if k == 0 {
        return Err(HybridError::Config("k must be positive".to_string()));
    }

    let mut total = 0.0f32;
    let mut users = 0usize;

    for (user_idx, positives) in test.by_user().iter().enumerate() {
        if positives.is_empty() {
            continue;
        }

        let scores = model.predict_all(user_idx)?;
        let exclude = known_items(train, user_idx);
        let ranked = top_n_excluding(&scores, k, &exclude)?;

        let relevant: HashSet<usize> = positives.iter().map(|&(i, _)| i).collect();
        let hits = ranked.iter().filter(|&i| relevant.contains(i)).count();

        total += hits as f32 / k as f32;
        users += 1;
    }

    if users == 0 {
        return Err(HybridError::EmptyDataset(
            "no users with test interactions".to_string(),
        ));
    }

    Ok(total / users as f32)
}

/// Mean per-user probability that a test positive outscores a non-positive item.
///
/// Ties count half. Items in `train` are left out of the comparison.
pub fn auc_score(
    model: &HybridModel,
    test: &InteractionMatrix,
    train: Option<&InteractionMatrix>,
) -> Result<f32> {
    let mut total = 0.0f32;
    let mut users = 0usize;

    for (user_idx, positives) in test.by_user().iter().enumerate() {
        if positives.is_empty() {
            continue;
        }

        let scores = model.predict_all(user_idx)?;
        let exclude = known_items(train, user_idx);
        let positive: HashSet<usize> = positives.iter().map(|&(i, _)| i).collect();

        let negatives: Vec<f32> = (0..scores.len())
            .filter(|i| !positive.contains(i) && !exclude.contains(i))
            .map(|i| scores[i])
            .collect();
        if negatives.is_empty() {
            continue;
        }

        let mut wins = 0.0f32;
        for &p in &positive {
            for &n in &negatives {
                if scores[p] > n {
                    wins += 1.0;
                } else if scores[p] == n {
                    wins += 0.5;
                }
            }
        }

        total += wins / (positive.len() * negatives.len()) as f32;
        users += 1;
    }

    if users == 0 {
        return Err(HybridError::EmptyDataset(
            "no users with test interactions and negatives".to_string(),
        ));
    }

    Ok(total / users as f32)
}
