use crate::core::scoring::model::DEFAULT_CONFORMER_SEED;
use crate::core::scoring::weights::{InvalidWeight, WeightConfig};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_CONCURRENCY: usize = 1;
pub const DEFAULT_NUM_CONFORMERS: usize = 50;
pub const DEFAULT_MIN_SCORE: f64 = 0.0;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Provide either a single query or a batch query file, not both")]
    ConflictingQuerySources,

    #[error("No query given: provide a single query or a batch query file")]
    MissingQuerySource,

    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error(transparent)]
    InvalidWeight(#[from] InvalidWeight),
}

/// Where the queries of a run come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    /// One SMILES string or structure-file path.
    Single(String),
    /// A CSV file with `name` plus `SMILES` or `File` columns.
    Batch(PathBuf),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningConfig {
    pub query_source: QuerySource,
    pub database_dir: PathBuf,
    pub output_path: PathBuf,
    pub concurrency: usize,
    pub num_conformers: usize,
    pub min_score: f64,
    pub top_n: Option<usize>,
    pub weights: WeightConfig,
    pub task_timeout: Option<Duration>,
    pub seed: u64,
}

#[derive(Default)]
pub struct ScreeningConfigBuilder {
    single_query: Option<String>,
    batch_queries: Option<PathBuf>,
    database_dir: Option<PathBuf>,
    output_path: Option<PathBuf>,
    concurrency: Option<usize>,
    num_conformers: Option<usize>,
    min_score: Option<f64>,
    top_n: Option<usize>,
    weights: Option<WeightConfig>,
    task_timeout: Option<Duration>,
    seed: Option<u64>,
}

impl ScreeningConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single_query(mut self, payload: impl Into<String>) -> Self {
        self.single_query = Some(payload.into());
        self
    }
    pub fn batch_queries(mut self, path: PathBuf) -> Self {
        self.batch_queries = Some(path);
        self
    }
    pub fn database_dir(mut self, path: PathBuf) -> Self {
        self.database_dir = Some(path);
        self
    }
    pub fn output_path(mut self, path: PathBuf) -> Self {
        self.output_path = Some(path);
        self
    }
    pub fn concurrency(mut self, workers: usize) -> Self {
        self.concurrency = Some(workers);
        self
    }
    pub fn num_conformers(mut self, n: usize) -> Self {
        self.num_conformers = Some(n);
        self
    }
    pub fn min_score(mut self, threshold: f64) -> Self {
        self.min_score = Some(threshold);
        self
    }
    pub fn top_n(mut self, n: Option<usize>) -> Self {
        self.top_n = n;
        self
    }
    pub fn weights(mut self, weights: WeightConfig) -> Self {
        self.weights = Some(weights);
        self
    }
    pub fn task_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.task_timeout = timeout;
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<ScreeningConfig, ConfigError> {
        let query_source = match (self.single_query, self.batch_queries) {
            (Some(_), Some(_)) => return Err(ConfigError::ConflictingQuerySources),
            (None, None) => return Err(ConfigError::MissingQuerySource),
            (Some(payload), None) => {
                if payload.trim().is_empty() {
                    return Err(invalid("query", "must not be empty"));
                }
                QuerySource::Single(payload.trim().to_string())
            }
            (None, Some(path)) => QuerySource::Batch(path),
        };

        let concurrency = self.concurrency.unwrap_or(DEFAULT_CONCURRENCY);
        if concurrency == 0 {
            return Err(invalid("concurrency", "must be at least 1"));
        }
        let num_conformers = self.num_conformers.unwrap_or(DEFAULT_NUM_CONFORMERS);
        if num_conformers == 0 {
            return Err(invalid("num_conformers", "must be at least 1"));
        }
        let min_score = self.min_score.unwrap_or(DEFAULT_MIN_SCORE);
        if !min_score.is_finite() {
            return Err(invalid("min_score", "must be a finite number"));
        }
        if self.task_timeout.is_some_and(|t| t.is_zero()) {
            return Err(invalid("task_timeout", "must be greater than zero"));
        }
        let weights = self.weights.unwrap_or_default();
        weights.validate()?;

        Ok(ScreeningConfig {
            query_source,
            database_dir: self
                .database_dir
                .ok_or(ConfigError::MissingParameter("database_dir"))?,
            output_path: self
                .output_path
                .ok_or(ConfigError::MissingParameter("output_path"))?,
            concurrency,
            num_conformers,
            min_score,
            top_n: self.top_n,
            weights,
            task_timeout: self.task_timeout,
            seed: self.seed.unwrap_or(DEFAULT_CONFORMER_SEED),
        })
    }
}

fn invalid(name: &'static str, reason: &str) -> ConfigError {
    ConfigError::InvalidParameter {
        name,
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::feature::FeatureKind;

    fn base() -> ScreeningConfigBuilder {
        ScreeningConfigBuilder::new()
            .database_dir(PathBuf::from("db"))
            .output_path(PathBuf::from("out.csv"))
    }

    #[test]
    fn build_applies_defaults() {
        let config = base().single_query("CCO").build().unwrap();
        assert_eq!(config.query_source, QuerySource::Single("CCO".to_string()));
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.num_conformers, 50);
        assert_eq!(config.min_score, 0.0);
        assert_eq!(config.top_n, None);
        assert_eq!(config.weights, WeightConfig::default());
        assert_eq!(config.task_timeout, None);
        assert_eq!(config.seed, 42);
    }

    #[test]
    fn both_query_sources_conflict() {
        let err = base()
            .single_query("CCO")
            .batch_queries(PathBuf::from("q.csv"))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::ConflictingQuerySources);
    }

    #[test]
    fn missing_query_source_is_rejected() {
        assert_eq!(base().build().unwrap_err(), ConfigError::MissingQuerySource);
    }

    #[test]
    fn missing_paths_are_reported_by_name() {
        let err = ScreeningConfigBuilder::new()
            .single_query("CCO")
            .output_path(PathBuf::from("out.csv"))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("database_dir"));

        let err = ScreeningConfigBuilder::new()
            .single_query("CCO")
            .database_dir(PathBuf::from("db"))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingParameter("output_path"));
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        assert!(matches!(
            base().single_query("CCO").concurrency(0).build(),
            Err(ConfigError::InvalidParameter { name: "concurrency", .. })
        ));
        assert!(matches!(
            base().single_query("CCO").num_conformers(0).build(),
            Err(ConfigError::InvalidParameter { name: "num_conformers", .. })
        ));
        assert!(matches!(
            base().single_query("CCO").min_score(f64::NAN).build(),
            Err(ConfigError::InvalidParameter { name: "min_score", .. })
        ));
        assert!(matches!(
            base().single_query("   ").build(),
            Err(ConfigError::InvalidParameter { name: "query", .. })
        ));
        assert!(matches!(
            base()
                .single_query("CCO")
                .task_timeout(Some(Duration::ZERO))
                .build(),
            Err(ConfigError::InvalidParameter { name: "task_timeout", .. })
        ));
    }

    #[test]
    fn negative_weights_are_rejected() {
        let mut weights = WeightConfig::default();
        weights.set(FeatureKind::Anion, -1.0);
        let err = base().single_query("CCO").weights(weights).build().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeight(w) if w.kind == FeatureKind::Anion));
    }
}
