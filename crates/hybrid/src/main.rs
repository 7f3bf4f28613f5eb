//! Hybrid Recommender - batch training and top-N listing
//!
//! Trains on the configured ratings and movie tables, then prints the
//! recommendations for each sample user.

use anyhow::{Context, Result};
use media_gateway_hybrid::config::LoggingConfig;
use media_gateway_hybrid::data::{load_movies, load_ratings};
use media_gateway_hybrid::{HybridConfig, OutputFormat, Pipeline, Recommendation, UserId};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct UserListing<'a> {
    user_id: UserId,
    recommendations: &'a [Recommendation],
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = HybridConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.logging);

    info!(
        "Starting hybrid recommender (ratings: {:?}, movies: {:?})",
        config.data.ratings_path, config.data.movies_path
    );

    let ratings = load_ratings(&config.data.ratings_path).with_context(|| {
        format!("Failed to load ratings from {}", config.data.ratings_path.display())
    })?;
    let movies = load_movies(&config.data.movies_path).with_context(|| {
        format!("Failed to load movies from {}", config.data.movies_path.display())
    })?;

    let pipeline = Pipeline::new(config.clone());
    let recommender = pipeline
        .build(ratings, movies)
        .context("Failed to train recommender")?;

    let top_n = config.recommend.top_n;
    for &user_id in &config.recommend.sample_users {
        let recommendations = recommender
            .recommend(user_id, top_n)
            .with_context(|| format!("Failed to recommend for user {}", user_id))?;

        match config.output.format {
            OutputFormat::Text => {
                println!("Top {} recommendations for user {}:", top_n, user_id);
                if recommendations.is_empty() {
                    println!("  (user not found)");
                }
                for rec in &recommendations {
                    println!("  {}", rec);
                }
                println!();
            }
            OutputFormat::Json => {
                let listing = UserListing {
                    user_id,
                    recommendations: &recommendations,
                };
                println!("{}", serde_json::to_string(&listing)?);
            }
        }
    }

    Ok(())
}
