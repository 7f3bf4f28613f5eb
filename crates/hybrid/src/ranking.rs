//! Top-N selection over a score vector

use crate::error::{HybridError, Result};
use std::collections::HashSet;

/// Indices of the `n` highest scores, best first.
///
/// Ties keep ascending index order. Any non-finite score is an error.
pub fn top_n(scores: &[f32], n: usize) -> Result<Vec<usize>> {
    top_n_excluding(scores, n, &HashSet::new())
}

/// Like [`top_n`], skipping the indices in `exclude`
pub fn top_n_excluding(scores: &[f32], n: usize, exclude: &HashSet<usize>) -> Result<Vec<usize>> {
    if let Some(index) = scores.iter().position(|s| !s.is_finite()) {
        return Err(HybridError::InvalidScore { index });
    }

    let mut ranked: Vec<usize> = (0..scores.len())
        .filter(|idx| !exclude.contains(idx))
        .collect();

    // Stable sort keeps ascending index order among equal scores
    ranked.sort_by(|&a, &b| scores[b].total_cmp(&scores[a]));
    ranked.truncate(n);

    Ok(ranked)
}
