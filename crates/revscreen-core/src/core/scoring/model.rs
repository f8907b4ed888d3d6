use super::error::ScoringError;
use super::matching::score_conformer;
use super::weights::WeightConfig;
use crate::core::chem::conformer::{ConformerGenerator, RandomWalkEmbedder, place_at, random_rotation};
use crate::core::chem::perception::{feature_points, perceive_features};
use crate::core::io::model_file::ModelFile;
use crate::core::io::read_structure;
use crate::core::io::smiles::parse_smiles;
use crate::core::models::hotspot::{Hotspot, centroid};
use nalgebra::Point3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;
use tracing::trace;

/// Default seed for conformer generation, so repeated runs rank identically.
pub const DEFAULT_CONFORMER_SEED: u64 = 42;
/// Random rigid orientations tried for every generated conformer.
const ORIENTATIONS_PER_CONFORMER: usize = 8;

/// A loaded pharmacophore model that can score query molecules.
pub trait PharmacophoreModel {
    /// Scores a molecule given as a line notation, generating up to
    /// `num_conformers` 3D conformers and returning the best match.
    fn score_against_notation(
        &self,
        notation: &str,
        num_conformers: usize,
        weights: &WeightConfig,
    ) -> Result<f64, ScoringError>;

    /// Scores the 3D structure(s) stored in a file without generating conformers.
    fn score_against_structure(&self, path: &Path, weights: &WeightConfig) -> Result<f64, ScoringError>;
}

/// Loads file-backed pharmacophore models. Shared by every worker of a run.
pub trait ModelLoader: Send + Sync {
    type Model: PharmacophoreModel;

    fn load(&self, path: &Path) -> Result<Self::Model, ScoringError>;
}

/// The built-in model: a set of hotspots scored by Gaussian feature overlap.
#[derive(Debug, Clone)]
pub struct HotspotModel {
    name: String,
    hotspots: Vec<Hotspot>,
    center: Point3<f64>,
    seed: u64,
    embedder: RandomWalkEmbedder,
}

impl HotspotModel {
    pub fn new(name: &str, hotspots: Vec<Hotspot>, seed: u64) -> Self {
        let center = centroid(&hotspots).unwrap_or_else(Point3::origin);
        Self {
            name: name.to_string(),
            hotspots,
            center,
            seed,
            embedder: RandomWalkEmbedder::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hotspots(&self) -> &[Hotspot] {
        &self.hotspots
    }
}

impl PharmacophoreModel for HotspotModel {
    fn score_against_notation(
        &self,
        notation: &str,
        num_conformers: usize,
        weights: &WeightConfig,
    ) -> Result<f64, ScoringError> {
        let molecule = parse_smiles(notation)?;
        let features = perceive_features(&molecule);
        if features.is_empty() {
            return Ok(0.0);
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let conformers = self.embedder.generate(&molecule, num_conformers, &mut rng)?;

        let mut best = 0.0f64;
        for conformer in &conformers {
            for _ in 0..ORIENTATIONS_PER_CONFORMER {
                let rotation = random_rotation(&mut rng);
                let placed = place_at(conformer, self.center, &rotation);
                let points = feature_points(&features, &placed);
                best = best.max(score_conformer(&points, &self.hotspots, weights));
            }
        }
        trace!(model = %self.name, conformers = conformers.len(), best, "Scored SMILES query.");
        Ok(best)
    }

    fn score_against_structure(&self, path: &Path, weights: &WeightConfig) -> Result<f64, ScoringError> {
        let records = read_structure(path)?;
        let best = records
            .iter()
            .map(|molecule| {
                let features = perceive_features(molecule);
                let points = feature_points(&features, &molecule.positions());
                score_conformer(&points, &self.hotspots, weights)
            })
            .fold(0.0f64, f64::max);
        trace!(model = %self.name, records = records.len(), best, "Scored structure query.");
        Ok(best)
    }
}

/// Loads `.pm` model files into [`HotspotModel`]s.
#[derive(Debug, Clone, Copy)]
pub struct HotspotModelLoader {
    pub seed: u64,
}

impl HotspotModelLoader {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl Default for HotspotModelLoader {
    fn default() -> Self {
        Self::new(DEFAULT_CONFORMER_SEED)
    }
}

impl ModelLoader for HotspotModelLoader {
    type Model = HotspotModel;

    fn load(&self, path: &Path) -> Result<Self::Model, ScoringError> {
        let file = ModelFile::load(path)?;
        Ok(HotspotModel::new(&file.name, file.hotspots, self.seed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::feature::FeatureKind;
    use std::fs;
    use tempfile::tempdir;

    const ACETONE_SDF: &str = "\
acetone
  test

  4  3  0  0  0  0  0  0  0  0999 V2000
    0.0000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    1.5000    0.0000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
    2.2000    1.2000    0.0000 O   0  0  0  0  0  0  0  0  0  0  0  0
    2.2000   -1.3000    0.0000 C   0  0  0  0  0  0  0  0  0  0  0  0
  1  2  1  0
  2  3  2  0
  2  4  1  0
M  END
$$$$
";

    fn acceptor_model() -> HotspotModel {
        HotspotModel::new(
            "acceptor",
            vec![Hotspot::new(
                FeatureKind::HBondAcceptor,
                Point3::new(2.2, 1.2, 0.0),
                1.0,
            )],
            DEFAULT_CONFORMER_SEED,
        )
    }

    #[test]
    fn structure_scoring_rewards_features_on_hotspots() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("acetone.sdf");
        fs::write(&path, ACETONE_SDF).unwrap();

        let score = acceptor_model()
            .score_against_structure(&path, &WeightConfig::default())
            .unwrap();
        assert!((score - 4.0).abs() < 1e-9);
    }

    #[test]
    fn structure_scoring_fails_for_unreadable_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ligand.txt");
        fs::write(&path, "nothing").unwrap();
        let result = acceptor_model().score_against_structure(&path, &WeightConfig::default());
        assert!(matches!(result, Err(ScoringError::Structure(_))));
    }

    #[test]
    fn smiles_scoring_is_deterministic_and_bounded() {
        let model = acceptor_model();
        let weights = WeightConfig::default();
        let a = model.score_against_notation("CC(=O)C", 10, &weights).unwrap();
        let b = model.score_against_notation("CC(=O)C", 10, &weights).unwrap();
        assert_eq!(a, b);
        assert!(a > 0.0);
        assert!(a <= 4.0 + 1e-9);
    }

    #[test]
    fn smiles_without_matching_features_scores_zero() {
        let model = acceptor_model();
        let score = model
            .score_against_notation("CCCC", 5, &WeightConfig::default())
            .unwrap();
        assert_eq!(score, 0.0);
    }

    #[test]
    fn invalid_smiles_is_a_scoring_error() {
        let result = acceptor_model().score_against_notation("C1CC", 5, &WeightConfig::default());
        assert!(matches!(result, Err(ScoringError::Smiles(_))));
    }

    #[test]
    fn loader_reads_model_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("target.pm");
        fs::write(
            &path,
            "[[hotspots]]\nfeature = \"Cation\"\nposition = [1.0, 1.0, 1.0]\nscore = 0.8\n",
        )
        .unwrap();
        let model = HotspotModelLoader::default().load(&path).unwrap();
        assert_eq!(model.name(), "target");
        assert_eq!(model.hotspots().len(), 1);
    }

    #[test]
    fn loader_reports_corrupt_model_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("corrupt.pm");
        fs::write(&path, "\u{0}\u{1}garbage").unwrap();
        let result = HotspotModelLoader::default().load(&path);
        assert!(matches!(result, Err(ScoringError::ModelLoad(_))));
    }
}
