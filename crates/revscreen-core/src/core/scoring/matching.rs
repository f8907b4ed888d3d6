use super::weights::WeightConfig;
use crate::core::chem::perception::FeaturePoint;
use crate::core::models::hotspot::Hotspot;

/// Weighted pharmacophore match of one ligand conformer against a hotspot set.
///
/// Every hotspot is matched to the nearest ligand feature of the same kind; the
/// contribution decays as a Gaussian of that distance with the hotspot's radius as
/// width. Hotspots without any same-kind ligand feature contribute nothing.
pub fn score_conformer(points: &[FeaturePoint], hotspots: &[Hotspot], weights: &WeightConfig) -> f64 {
    hotspots
        .iter()
        .map(|hotspot| {
            let weight = weights.get(hotspot.feature);
            if weight == 0.0 || hotspot.score == 0.0 {
                return 0.0;
            }
            let nearest_sq = points
                .iter()
                .filter(|p| p.kind == hotspot.feature)
                .map(|p| (p.position - hotspot.position).norm_squared())
                .fold(f64::INFINITY, f64::min);
            if nearest_sq.is_infinite() {
                return 0.0;
            }
            let width_sq = 2.0 * hotspot.radius * hotspot.radius;
            weight * hotspot.score * (-nearest_sq / width_sq).exp()
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::feature::FeatureKind;
    use nalgebra::Point3;

    fn point(kind: FeatureKind, x: f64) -> FeaturePoint {
        FeaturePoint {
            kind,
            position: Point3::new(x, 0.0, 0.0),
        }
    }

    #[test]
    fn perfect_overlap_scores_weight_times_hotspot_score() {
        let hotspots = vec![Hotspot::new(FeatureKind::Cation, Point3::origin(), 0.5)];
        let points = vec![point(FeatureKind::Cation, 0.0)];
        let score = score_conformer(&points, &hotspots, &WeightConfig::default());
        assert!((score - 4.0).abs() < 1e-12);
    }

    #[test]
    fn score_decays_with_distance() {
        let hotspots = vec![Hotspot::new(FeatureKind::Aromatic, Point3::origin(), 1.0)];
        let weights = WeightConfig::default();
        let near = score_conformer(&[point(FeatureKind::Aromatic, 0.5)], &hotspots, &weights);
        let far = score_conformer(&[point(FeatureKind::Aromatic, 3.0)], &hotspots, &weights);
        assert!(near > far);
        assert!(far > 0.0);
    }

    #[test]
    fn mismatched_kinds_do_not_contribute() {
        let hotspots = vec![Hotspot::new(FeatureKind::Anion, Point3::origin(), 1.0)];
        let points = vec![point(FeatureKind::Cation, 0.0)];
        assert_eq!(score_conformer(&points, &hotspots, &WeightConfig::default()), 0.0);
    }

    #[test]
    fn nearest_same_kind_feature_is_used() {
        let hotspots = vec![Hotspot::new(FeatureKind::HBondDonor, Point3::origin(), 1.0)];
        let points = vec![
            point(FeatureKind::HBondDonor, 5.0),
            point(FeatureKind::HBondDonor, 0.0),
        ];
        let score = score_conformer(&points, &hotspots, &WeightConfig::default());
        assert!((score - 4.0).abs() < 1e-12);
    }

    #[test]
    fn zero_weight_disables_a_feature() {
        let hotspots = vec![Hotspot::new(FeatureKind::Halogen, Point3::origin(), 1.0)];
        let mut weights = WeightConfig::default();
        weights.halogen = 0.0;
        let points = vec![point(FeatureKind::Halogen, 0.0)];
        assert_eq!(score_conformer(&points, &hotspots, &weights), 0.0);
    }
}
