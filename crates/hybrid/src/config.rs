use crate::error::{HybridError, Result};
use crate::hybrid::DEFAULT_CONTENT_WEIGHT;
use crate::matrix_factorization::ALSConfig;
use crate::types::UserId;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Hybrid recommender configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct HybridConfig {
    /// Input table locations
    pub data: DataConfig,

    /// Sparse user filtering
    pub filter: FilterConfig,

    /// Factorization and blending parameters
    pub model: ModelConfig,

    /// Which users to recommend for and how many titles
    pub recommend: RecommendConfig,

    /// Listing format
    pub output: OutputConfig,

    /// Log level and format
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DataConfig {
    /// Ratings CSV (userId,movieId,rating,timestamp)
    pub ratings_path: PathBuf,

    /// Movies CSV (movieId,title,genres)
    pub movies_path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            ratings_path: PathBuf::from("data/ratings.csv"),
            movies_path: PathBuf::from("data/movies.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Users with fewer ratings are dropped (default: 5)
    pub min_ratings_per_user: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_ratings_per_user: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of latent factors (default: 32)
    pub latent_factors: usize,

    /// ALS ridge penalty (default: 0.1)
    pub regularization: f32,

    /// ALS sweeps (default: 15)
    pub iterations: usize,

    /// Implicit feedback confidence scaling (default: 10)
    pub alpha: f32,

    /// Factor initialization seed (default: 42)
    pub seed: u64,

    /// Share of the final score taken from genre similarity (default: 0.3)
    pub content_weight: f32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        let als = ALSConfig::default();
        Self {
            latent_factors: als.latent_factors,
            regularization: als.regularization,
            iterations: als.iterations,
            alpha: als.alpha,
            seed: als.seed,
            content_weight: DEFAULT_CONTENT_WEIGHT,
        }
    }
}

impl ModelConfig {
    pub fn als(&self) -> ALSConfig {
        ALSConfig {
            latent_factors: self.latent_factors,
            regularization: self.regularization,
            iterations: self.iterations,
            alpha: self.alpha,
            seed: self.seed,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RecommendConfig {
    /// List length (default: 10)
    pub top_n: usize,

    /// Users printed by the binary
    pub sample_users: Vec<UserId>,

    /// Drop titles the user already rated
    pub exclude_known: bool,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            top_n: 10,
            sample_users: vec![1, 2, 3],
            exclude_known: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when RUST_LOG is unset
    pub level: String,

    /// Emit JSON log lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl HybridConfig {
    /// Load configuration from `config/hybrid.*` and `HYBRID_*` environment variables
    pub fn load() -> Result<Self> {
        Self::load_from("config/hybrid")
    }

    pub fn load_from(file: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("HYBRID")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("recommend.sample_users")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.data.ratings_path.as_os_str().is_empty() {
            return Err(HybridError::Config("data.ratings_path is empty".to_string()));
        }
        if self.data.movies_path.as_os_str().is_empty() {
            return Err(HybridError::Config("data.movies_path is empty".to_string()));
        }
        if self.model.latent_factors == 0 {
            return Err(HybridError::Config(
                "model.latent_factors must be positive".to_string(),
            ));
        }
        if self.model.regularization <= 0.0 {
            return Err(HybridError::Config(
                "model.regularization must be positive".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.model.content_weight) {
            return Err(HybridError::Config(format!(
                "model.content_weight must be within [0, 1], got {}",
                self.model.content_weight
            )));
        }
        if self.recommend.top_n == 0 {
            return Err(HybridError::Config(
                "recommend.top_n must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
