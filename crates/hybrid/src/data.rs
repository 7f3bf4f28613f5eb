//! Ratings and movie metadata loading
//!
//! Reads the two flat tables from CSV, drops users with too few ratings and
//! joins the remaining ratings with their movie's title and genres.

use crate::error::{HybridError, Result};
use crate::types::{Movie, MovieId, RatedMovie, Rating, UserId};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Load the ratings table (`userId,movieId,rating,timestamp`) from disk
pub fn load_ratings<P: AsRef<Path>>(path: P) -> Result<Vec<Rating>> {
    info!("Loading ratings from CSV: {:?}", path.as_ref());
    load_table(path.as_ref())
}

/// Read the ratings table from any reader with a header row
pub fn read_ratings<R: Read>(reader: R) -> Result<Vec<Rating>> {
    Ok(collect_records(csv::Reader::from_reader(reader))?)
}

/// Load the movie table (`movieId,title,genres`) from disk
pub fn load_movies<P: AsRef<Path>>(path: P) -> Result<Vec<Movie>> {
    info!("Loading movies from CSV: {:?}", path.as_ref());
    load_table(path.as_ref())
}

/// Read the movie table from any reader with a header row
pub fn read_movies<R: Read>(reader: R) -> Result<Vec<Movie>> {
    Ok(collect_records(csv::Reader::from_reader(reader))?)
}

fn load_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    csv::Reader::from_path(path)
        .and_then(collect_records)
        .map_err(|source| HybridError::CsvFile {
            path: path.to_path_buf(),
            source,
        })
}

fn collect_records<R, T>(mut reader: csv::Reader<R>) -> csv::Result<Vec<T>>
where
    R: Read,
    T: DeserializeOwned,
{
    reader.deserialize().collect()
}

/// Keep only ratings from users with at least `min_ratings` ratings.
///
/// Input order is preserved.
pub fn filter_sparse_users(ratings: &[Rating], min_ratings: usize) -> Vec<Rating> {
    let mut counts: HashMap<UserId, usize> = HashMap::new();
    for rating in ratings {
        *counts.entry(rating.user_id).or_insert(0) += 1;
    }

    let kept: Vec<Rating> = ratings
        .iter()
        .filter(|r| counts.get(&r.user_id).copied().unwrap_or(0) >= min_ratings)
        .cloned()
        .collect();

    let kept_users = counts.values().filter(|&&c| c >= min_ratings).count();
    info!(
        "Kept {} of {} users ({} of {} ratings) with >= {} ratings",
        kept_users,
        counts.len(),
        kept.len(),
        ratings.len(),
        min_ratings
    );

    kept
}

/// Inner join of ratings with movie metadata on movie id.
///
/// Ratings whose movie is absent from the catalog are dropped.
pub fn join_movies(ratings: &[Rating], movies: &[Movie]) -> Vec<RatedMovie> {
    let catalog: HashMap<MovieId, &Movie> = movies.iter().map(|m| (m.movie_id, m)).collect();

    let mut joined = Vec::with_capacity(ratings.len());
    let mut dropped = 0usize;

    for rating in ratings {
        match catalog.get(&rating.movie_id) {
            Some(movie) => joined.push(RatedMovie {
                user_id: rating.user_id,
                movie_id: rating.movie_id,
                rating: rating.rating,
                timestamp: rating.timestamp,
                title: movie.title.clone(),
                genres: movie.genres.clone(),
            }),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("Dropped {} ratings with no movie metadata", dropped);
    }

    joined
}
