use revscreen::core::scoring::model::DEFAULT_CONFORMER_SEED;
use revscreen::core::scoring::weights::WeightConfig;
use revscreen::engine::config::{DEFAULT_CONCURRENCY, DEFAULT_MIN_SCORE, DEFAULT_NUM_CONFORMERS};

pub struct DefaultsConfig {
    pub concurrency: usize,
    pub num_conformers: usize,
    pub min_score: f64,
    pub seed: u64,
    pub weights: WeightConfig,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            num_conformers: DEFAULT_NUM_CONFORMERS,
            min_score: DEFAULT_MIN_SCORE,
            seed: DEFAULT_CONFORMER_SEED,
            weights: WeightConfig::default(),
        }
    }
}
