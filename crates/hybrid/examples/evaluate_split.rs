//! Example: Held-out Evaluation
//!
//! Splits the filtered interactions into train and test sets, trains the
//! hybrid model on the train side and reports precision@k and AUC for both.
//!
//! Run with:
//! ```bash
//! export HYBRID_DATA__RATINGS_PATH=data/ratings.csv
//! export HYBRID_DATA__MOVIES_PATH=data/movies.csv
//! cargo run --example evaluate_split
//! ```

use anyhow::{Context, Result};
use media_gateway_hybrid::data::{load_movies, load_ratings};
use media_gateway_hybrid::pipeline::{build_dataset, prepare_ratings, vectorize_genres};
use media_gateway_hybrid::{auc_score, precision_at_k, train_test_split, HybridConfig, HybridModel};

const TEST_FRACTION: f32 = 0.2;
const K: usize = 10;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let config = HybridConfig::load().context("Failed to load configuration")?;

    let ratings = load_ratings(&config.data.ratings_path)?;
    let movies = load_movies(&config.data.movies_path)?;

    let joined = prepare_ratings(&ratings, &movies, config.filter.min_ratings_per_user)?;
    let genres = vectorize_genres(&movies);
    let (dataset, interactions) = build_dataset(&joined)?;
    let item_features = dataset.align_item_features(&genres.matrix, &genres.row_of)?;

    let (train, test) = train_test_split(&interactions, TEST_FRACTION, config.model.seed)?;
    println!(
        "Split {} interactions into {} train / {} test",
        interactions.nnz(),
        train.nnz(),
        test.nnz()
    );

    let mut model = HybridModel::new(config.model.als(), config.model.content_weight);
    model.fit(&train, item_features)?;

    println!(
        "Train precision@{}: {:.4}",
        K,
        precision_at_k(&model, &train, None, K)?
    );
    println!(
        "Test precision@{}:  {:.4}",
        K,
        precision_at_k(&model, &test, Some(&train), K)?
    );
    println!("Train AUC: {:.4}", auc_score(&model, &train, None)?);
    println!("Test AUC:  {:.4}", auc_score(&model, &test, Some(&train))?);

    Ok(())
}
