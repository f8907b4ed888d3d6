use super::defaults::DefaultsConfig;
use super::file::{FileConfig, FileWeightsConfig};
use crate::cli::{ScreenArgs, WeightArgs};
use crate::error::{CliError, Result};
use revscreen::core::models::feature::FeatureKind;
use revscreen::core::scoring::weights::WeightConfig;
use revscreen::engine::config::{ScreeningConfig, ScreeningConfigBuilder};
use std::time::Duration;

/// Merges command-line arguments, the optional config file and built-in defaults.
pub fn build_config(args: &ScreenArgs) -> Result<ScreeningConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = match &args.config {
        Some(path) => FileConfig::from_file(path)?,
        None => FileConfig::default(),
    };
    let screening = file_config.screening.unwrap_or_default();
    let weights = merge_weights(
        &args.weights,
        &file_config.weights.unwrap_or_default(),
        defaults.weights,
    );

    let mut builder = ScreeningConfigBuilder::new()
        .concurrency(args.cpus.or(screening.concurrency).unwrap_or(defaults.concurrency))
        .num_conformers(
            args.num_conformers
                .or(screening.num_conformers)
                .unwrap_or(defaults.num_conformers),
        )
        .min_score(args.min_score.or(screening.min_score).unwrap_or(defaults.min_score))
        .top_n(args.top_n.or(screening.top_n))
        .task_timeout(
            args.timeout_secs
                .or(screening.timeout_secs)
                .map(Duration::from_secs),
        )
        .seed(args.seed.or(screening.seed).unwrap_or(defaults.seed))
        .weights(weights);

    if let Some(query) = &args.query_molecule {
        builder = builder.single_query(query.as_str());
    }
    if let Some(path) = &args.query_csv {
        builder = builder.batch_queries(path.clone());
    }
    if let Some(dir) = args.model_database_dir.clone().or(screening.database_dir) {
        builder = builder.database_dir(dir);
    }
    if let Some(out) = args.out.clone().or(screening.out) {
        builder = builder.output_path(out);
    }

    builder.build().map_err(|e| CliError::Config(e.to_string()))
}

fn merge_weights(cli: &WeightArgs, file: &FileWeightsConfig, defaults: WeightConfig) -> WeightConfig {
    let mut weights = defaults;
    let overrides = [
        (FeatureKind::Hydrophobic, cli.hydrophobic.or(file.hydrophobic)),
        (FeatureKind::Aromatic, cli.aromatic.or(file.aromatic)),
        (FeatureKind::HBondAcceptor, cli.hba.or(file.hba)),
        (FeatureKind::HBondDonor, cli.hbd.or(file.hbd)),
        (FeatureKind::Halogen, cli.halogen.or(file.halogen)),
        (FeatureKind::Anion, cli.anion.or(file.anion)),
        (FeatureKind::Cation, cli.cation.or(file.cation)),
    ];
    for (kind, value) in overrides {
        if let Some(value) = value {
            weights.set(kind, value);
        }
    }
    weights
}
