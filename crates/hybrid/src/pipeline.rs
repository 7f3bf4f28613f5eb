//! End-to-end training pipeline
//!
//! Runs the stages in order, each taking its inputs explicitly:
//! 1. Load ratings and movies
//! 2. Filter sparse users and join titles
//! 3. Vectorize genre tags (TF-IDF)
//! 4. Map ids and build the interaction matrix
//! 5. Align feature rows to the item index order
//! 6. Train the hybrid model
//! 7. Hand back a `Recommender` for top-N queries

use crate::config::HybridConfig;
use crate::data::{
    filter_sparse_users, join_movies, load_movies, load_ratings, read_movies, read_ratings,
};
use crate::dataset::Dataset;
use crate::error::{HybridError, Result};
use crate::features::FeatureMatrix;
use crate::hybrid::HybridModel;
use crate::matrix_factorization::InteractionMatrix;
use crate::recommendation::Recommender;
use crate::tfidf::TfidfVectorizer;
use crate::types::{Movie, MovieId, RatedMovie, Rating};
use std::collections::HashMap;
use std::io::Read;
use tracing::info;

/// Genre vectors for the whole catalog, in catalog row order
#[derive(Debug, Clone)]
pub struct GenreFeatures {
    pub vectorizer: TfidfVectorizer,
    pub matrix: FeatureMatrix,
    /// Movie id -> row of `matrix`
    pub row_of: HashMap<MovieId, usize>,
}

pub struct Pipeline {
    config: HybridConfig,
}

impl Pipeline {
    pub fn new(config: HybridConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &HybridConfig {
        &self.config
    }

    /// Run every stage reading the CSV files named in the configuration
    pub fn run(&self) -> Result<Recommender> {
        let ratings = load_ratings(&self.config.data.ratings_path)?;
        let movies = load_movies(&self.config.data.movies_path)?;
        self.build(ratings, movies)
    }

    /// Run every stage reading the two tables from arbitrary sources
    pub fn run_from_readers<R, M>(&self, ratings: R, movies: M) -> Result<Recommender>
    where
        R: Read,
        M: Read,
    {
        let ratings = read_ratings(ratings)?;
        let movies = read_movies(movies)?;
        self.build(ratings, movies)
    }

    /// Stages 2 through 7 on already loaded tables
    pub fn build(&self, ratings: Vec<Rating>, movies: Vec<Movie>) -> Result<Recommender> {
        info!("Loaded {} ratings and {} movies", ratings.len(), movies.len());

        let joined = prepare_ratings(&ratings, &movies, self.config.filter.min_ratings_per_user)?;
        let genres = vectorize_genres(&movies);
        let (dataset, interactions) = build_dataset(&joined)?;
        let item_features = dataset.align_item_features(&genres.matrix, &genres.row_of)?;
        let model = self.train(&interactions, item_features)?;

        Ok(Recommender::new(dataset, movies, model, interactions)
            .with_exclude_known(self.config.recommend.exclude_known))
    }

    fn train(
        &self,
        interactions: &InteractionMatrix,
        item_features: FeatureMatrix,
    ) -> Result<HybridModel> {
        let mut model =
            HybridModel::new(self.config.model.als(), self.config.model.content_weight);
        model.fit(interactions, item_features)?;
        info!("Model trained");
        Ok(model)
    }
}

/// Drop sparse users and join the remaining ratings with movie metadata
pub fn prepare_ratings(
    ratings: &[Rating],
    movies: &[Movie],
    min_ratings_per_user: usize,
) -> Result<Vec<RatedMovie>> {
    let filtered = filter_sparse_users(ratings, min_ratings_per_user);
    let joined = join_movies(&filtered, movies);

    if joined.is_empty() {
        return Err(HybridError::EmptyDataset(format!(
            "no ratings left after filtering users with fewer than {} ratings and joining titles",
            min_ratings_per_user
        )));
    }

    info!("Joined {} ratings with movie titles", joined.len());
    Ok(joined)
}

/// TF-IDF over every movie's genre string
pub fn vectorize_genres(movies: &[Movie]) -> GenreFeatures {
    let documents: Vec<&str> = movies.iter().map(|m| m.genres.as_str()).collect();

    let mut vectorizer = TfidfVectorizer::new();
    let matrix = vectorizer.fit_transform(&documents);
    let row_of = movies
        .iter()
        .enumerate()
        .map(|(row, m)| (m.movie_id, row))
        .collect();

    info!(
        "Vectorized {} movies over {} genre terms",
        matrix.nrows(),
        matrix.ncols()
    );

    GenreFeatures {
        vectorizer,
        matrix,
        row_of,
    }
}

/// Id mappings and weighted interaction matrix from joined ratings
pub fn build_dataset(joined: &[RatedMovie]) -> Result<(Dataset, InteractionMatrix)> {
    let dataset = Dataset::fit(
        joined.iter().map(|r| r.user_id),
        joined.iter().map(|r| r.movie_id),
    );
    let interactions =
        dataset.build_interactions(joined.iter().map(|r| (r.user_id, r.movie_id, r.rating)))?;
    Ok((dataset, interactions))
}
