use crate::error::{CliError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileScreeningConfig {
    pub database_dir: Option<PathBuf>,
    pub out: Option<PathBuf>,
    pub concurrency: Option<usize>,
    pub num_conformers: Option<usize>,
    pub min_score: Option<f64>,
    pub top_n: Option<usize>,
    pub timeout_secs: Option<u64>,
    pub seed: Option<u64>,
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct FileWeightsConfig {
    pub hydrophobic: Option<f64>,
    pub aromatic: Option<f64>,
    pub hba: Option<f64>,
    pub hbd: Option<f64>,
    pub halogen: Option<f64>,
    pub anion: Option<f64>,
    pub cation: Option<f64>,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub screening: Option<FileScreeningConfig>,
    pub weights: Option<FileWeightsConfig>,
}

impl FileConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }
}
