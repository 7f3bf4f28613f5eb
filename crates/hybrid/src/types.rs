//! Core records shared across the pipeline

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = u32;
pub type MovieId = u32;

/// One row of the ratings table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    #[serde(rename = "userId")]
    pub user_id: UserId,
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    pub rating: f32,
    /// Seconds since the Unix epoch
    pub timestamp: i64,
}

impl Rating {
    pub fn rated_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.timestamp, 0)
    }
}

/// One row of the movie metadata table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(rename = "movieId")]
    pub movie_id: MovieId,
    pub title: String,
    /// Pipe-delimited genre tags, e.g. `Adventure|Comedy`
    pub genres: String,
}

impl Movie {
    pub fn genre_tags(&self) -> Vec<&str> {
        self.genres
            .split('|')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect()
    }
}

/// A rating joined with its movie's metadata
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedMovie {
    pub user_id: UserId,
    pub movie_id: MovieId,
    pub rating: f32,
    pub timestamp: i64,
    pub title: String,
    pub genres: String,
}

/// A single ranked entry in a user's recommendation list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// 1-based position in the list
    pub rank: usize,
    pub movie_id: MovieId,
    pub title: String,
    pub score: f32,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}. {}", self.rank, self.title)
    }
}
