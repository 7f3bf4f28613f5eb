//! Hybrid Movie Recommender
//!
//! Builds a hybrid recommender from a ratings table and a movie catalog:
//! TF-IDF genre vectors supply the content side, implicit-feedback ALS the
//! collaborative side, and a top-N ranking maps scores back to titles.

pub mod config;
pub mod data;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod features;
pub mod hybrid;
pub mod matrix_factorization;
pub mod pipeline;
pub mod ranking;
pub mod recommendation;
pub mod tfidf;
pub mod types;

// Re-export key types
pub use crate::config::{HybridConfig, OutputFormat};
pub use dataset::{Dataset, IdMapping};
pub use error::{HybridError, Result};
pub use evaluation::{auc_score, precision_at_k, train_test_split};
pub use features::FeatureMatrix;
pub use hybrid::HybridModel;
pub use matrix_factorization::{ALSConfig, InteractionMatrix, MatrixFactorization};
pub use pipeline::Pipeline;
pub use ranking::{top_n, top_n_excluding};
pub use recommendation::Recommender;
pub use tfidf::TfidfVectorizer;
pub use types::*;
