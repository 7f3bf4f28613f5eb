//! Top-N recommendation for a trained hybrid model
//!
//! Scores every item for the query user, ranks by descending score and maps
//! each internal item index back to its movie title.

use crate::dataset::Dataset;
use crate::error::{HybridError, Result};
use crate::hybrid::HybridModel;
use crate::matrix_factorization::{InteractionMatrix, MatrixFactorization};
use crate::ranking::{top_n, top_n_excluding};
use crate::types::{Movie, MovieId, Recommendation, UserId};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Trained model together with the index spaces and catalog it was built from
#[derive(Debug, Clone)]
pub struct Recommender {
    dataset: Dataset,
    movies: HashMap<MovieId, Movie>,
    model: HybridModel,
    interactions: InteractionMatrix,
    exclude_known: bool,
}

impl Recommender {
    pub fn new(
        dataset: Dataset,
        movies: impl IntoIterator<Item = Movie>,
        model: HybridModel,
        interactions: InteractionMatrix,
    ) -> Self {
        Self {
            dataset,
            movies: movies.into_iter().map(|m| (m.movie_id, m)).collect(),
            model,
            interactions,
            exclude_known: false,
        }
    }

    /// Drop titles the user already rated from the ranking
    pub fn with_exclude_known(mut self, exclude_known: bool) -> Self {
        self.exclude_known = exclude_known;
        self
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn model(&self) -> &HybridModel {
        &self.model
    }

    pub fn interactions(&self) -> &InteractionMatrix {
        &self.interactions
    }

    /// Top `n` titles for a user.
    ///
    /// An unknown user yields an empty list.
    pub fn recommend(&self, user_id: UserId, n: usize) -> Result<Vec<Recommendation>> {
        let Some(user_idx) = self.dataset.user_map.index_of(&user_id) else {
            warn!("User {} not found in dataset", user_id);
            return Ok(Vec::new());
        };

        let scores = self.model.predict_all(user_idx)?;

        let ranked = if self.exclude_known {
            let known: HashSet<usize> = self
                .interactions
                .user_items(user_idx)
                .into_iter()
                .map(|(item_idx, _)| item_idx)
                .collect();
            top_n_excluding(&scores, n, &known)?
        } else {
            top_n(&scores, n)?
        };

        debug!("Ranked {} of {} items for user {}", ranked.len(), scores.len(), user_id);

        ranked
            .into_iter()
            .enumerate()
            .map(|(pos, item_idx)| {
                let movie = self.movie_at(item_idx)?;
                Ok(Recommendation {
                    rank: pos + 1,
                    movie_id: movie.movie_id,
                    title: movie.title.clone(),
                    score: scores[item_idx],
                })
            })
            .collect()
    }

    /// Titles the user rated, highest rating first
    pub fn known_positives(&self, user_id: UserId) -> Result<Vec<String>> {
        let Some(user_idx) = self.dataset.user_map.index_of(&user_id) else {
            return Ok(Vec::new());
        };

        let mut items = self.interactions.user_items(user_idx);
        // Stable on equal ratings
        items.sort_by(|a, b| b.1.total_cmp(&a.1));

        items
            .into_iter()
            .map(|(item_idx, _)| self.movie_at(item_idx).map(|m| m.title.clone()))
            .collect()
    }

    /// Users whose ALS embeddings are closest to the given user's
    pub fn similar_users(&self, user_id: UserId, k: usize) -> Result<Vec<(UserId, f32)>> {
        let Some(user_idx) = self.dataset.user_map.index_of(&user_id) else {
            warn!("User {} not found in dataset", user_id);
            return Ok(Vec::new());
        };

        let als = self.model.als();
        let target = als.user_embedding(user_idx)?;
        let mut scores = Vec::with_capacity(self.dataset.num_users());
        for idx in 0..self.dataset.num_users() {
            let other = als.user_embedding(idx)?;
            scores.push(MatrixFactorization::cosine_similarity(&target, &other));
        }

        nearest(&scores, k, user_idx, |idx| {
            self.dataset.user_map.external_id(idx).copied().ok_or(
                HybridError::UnknownInternalIndex {
                    space: "user",
                    index: idx,
                },
            )
        })
    }

    /// Movies whose ALS embeddings are closest to the given movie's
    /// ("people who watched this also watched")
    pub fn similar_movies(&self, movie_id: MovieId, k: usize) -> Result<Vec<(MovieId, f32)>> {
        let Some(item_idx) = self.dataset.item_map.index_of(&movie_id) else {
            warn!("Movie {} not found in dataset", movie_id);
            return Ok(Vec::new());
        };

        let als = self.model.als();
        let target = als.item_embedding(item_idx)?;
        let mut scores = Vec::with_capacity(self.dataset.num_items());
        for idx in 0..self.dataset.num_items() {
            let other = als.item_embedding(idx)?;
            scores.push(MatrixFactorization::cosine_similarity(&target, &other));
        }

        nearest(&scores, k, item_idx, |idx| self.movie_at(idx).map(|m| m.movie_id))
    }

    fn movie_at(&self, item_idx: usize) -> Result<&Movie> {
        let movie_id = self
            .dataset
            .item_map
            .external_id(item_idx)
            .ok_or(HybridError::UnknownInternalIndex {
                space: "item",
                index: item_idx,
            })?;

        self.movies
            .get(movie_id)
            .ok_or(HybridError::UnknownMovie(*movie_id))
    }
}

/// Top `k` indices by similarity, skipping `itself`, mapped to external ids
fn nearest<T>(
    scores: &[f32],
    k: usize,
    itself: usize,
    external: impl Fn(usize) -> Result<T>,
) -> Result<Vec<(T, f32)>> {
    let skip: HashSet<usize> = [itself].into_iter().collect();

    top_n_excluding(scores, k, &skip)?
        .into_iter()
        .map(|idx| Ok((external(idx)?, scores[idx])))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::FeatureMatrix;
    use crate::matrix_factorization::ALSConfig;

    fn movie(id: MovieId, title: &str) -> Movie {
        Movie {
            movie_id: id,
            title: title.to_string(),
            genres: String::new(),
        }
    }

    /// Content-only model over two comedies (10, 20) and one drama (30)
    fn recommender(catalog: Vec<Movie>) -> Recommender {
        let dataset = Dataset::fit(vec![1, 2], vec![10, 20, 30]);
        let interactions = dataset
            .build_interactions(vec![(1, 10, 5.0), (2, 30, 4.0), (2, 20, 1.0)])
            .unwrap();

        let mut features = FeatureMatrix::new(2);
        features.push_row(vec![(0, 1.0)]);
        features.push_row(vec![(0, 1.0)]);
        features.push_row(vec![(1, 1.0)]);

        let mut model = HybridModel::new(
            ALSConfig {
                latent_factors: 2,
                iterations: 2,
                ..ALSConfig::default()
            },
            1.0,
        );
        model.fit(&interactions, features).unwrap();

        Recommender::new(dataset, catalog, model, interactions)
    }

    fn catalog() -> Vec<Movie> {
        vec![movie(10, "Comedy A"), movie(20, "Comedy B"), movie(30, "Drama C")]
    }

    #[test]
    fn test_recommend_ranks_and_titles() {
        let rec = recommender(catalog());
        let list = rec.recommend(1, 3).unwrap();

        assert_eq!(list.len(), 3);
        assert_eq!(list[0].rank, 1);
        assert_eq!(list[0].title, "Comedy A");
        assert_eq!(list[1].title, "Comedy B");
        assert_eq!(list[2].title, "Drama C");
        assert!(list[0].score >= list[1].score && list[1].score >= list[2].score);
    }

    #[test]
    fn test_exclude_known() {
        let rec = recommender(catalog()).with_exclude_known(true);
        let list = rec.recommend(1, 3).unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list[0].title, "Comedy B");
        assert_eq!(list[0].rank, 1);
    }

    #[test]
    fn test_unknown_user_returns_empty() {
        let rec = recommender(catalog());
        let before = rec.recommend(1, 3).unwrap();

        assert!(rec.recommend(999, 3).unwrap().is_empty());
        assert!(rec.known_positives(999).unwrap().is_empty());

        assert_eq!(rec.recommend(1, 3).unwrap(), before);
    }

    #[test]
    fn test_missing_movie_fails_loudly() {
        let rec = recommender(vec![movie(10, "Comedy A"), movie(20, "Comedy B")]);
        let err = rec.recommend(1, 3).unwrap_err();
        assert!(matches!(err, HybridError::UnknownMovie(30)));
    }

    #[test]
    fn test_known_positives_by_rating() {
        let rec = recommender(catalog());
        assert_eq!(rec.known_positives(2).unwrap(), vec!["Drama C", "Comedy B"]);
    }

    /// Two taste groups with identical histories inside each group
    fn twin_recommender() -> Recommender {
        let dataset = Dataset::fit(vec![1, 2, 3, 4], vec![10, 20, 30, 40]);
        let interactions = dataset
            .build_interactions(vec![
                (1, 10, 1.0),
                (1, 20, 1.0),
                (2, 10, 1.0),
                (2, 20, 1.0),
                (3, 30, 1.0),
                (3, 40, 1.0),
                (4, 30, 1.0),
                (4, 40, 1.0),
            ])
            .unwrap();

        let mut features = FeatureMatrix::new(1);
        for _ in 0..4 {
            features.push_row(vec![(0, 1.0)]);
        }

        let mut model = HybridModel::new(
            ALSConfig {
                latent_factors: 4,
                iterations: 10,
                seed: 7,
                ..ALSConfig::default()
            },
            0.0,
        );
        model.fit(&interactions, features).unwrap();

        let catalog = vec![
            movie(10, "A"),
            movie(20, "B"),
            movie(30, "C"),
            movie(40, "D"),
        ];
        Recommender::new(dataset, catalog, model, interactions)
    }

    #[test]
    fn test_similar_users_finds_twin() {
        let rec = twin_recommender();

        let similar = rec.similar_users(1, 3).unwrap();
        assert_eq!(similar.len(), 3);
        assert_eq!(similar[0].0, 2);
        assert!(similar[0].1 > 0.99);
        assert!(similar.iter().all(|&(id, _)| id != 1));

        assert!(rec.similar_users(999, 3).unwrap().is_empty());
    }

    #[test]
    fn test_similar_movies_finds_co_watched() {
        let rec = twin_recommender();

        let similar = rec.similar_movies(30, 10).unwrap();
        assert_eq!(similar.len(), 3);
        assert_eq!(similar[0].0, 40);
        for pair in similar.windows(2) {
            assert!(pair[0].1 >= pair[1].1);
        }

        assert!(rec.similar_movies(999, 3).unwrap().is_empty());
    }
}
