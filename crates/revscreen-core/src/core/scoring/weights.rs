use crate::core::models::feature::FeatureKind;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("Weight for feature '{kind}' must be finite and non-negative (got {value})")]
pub struct InvalidWeight {
    pub kind: FeatureKind,
    pub value: f64,
}

/// Per-feature weights applied uniformly to every scoring call of a run.
///
/// Built once from caller parameters and passed by value into each worker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightConfig {
    pub hydrophobic: f64,
    pub aromatic: f64,
    pub hbond_donor: f64,
    pub hbond_acceptor: f64,
    pub halogen: f64,
    pub anion: f64,
    pub cation: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            hydrophobic: 1.0,
            aromatic: 4.0,
            hbond_donor: 4.0,
            hbond_acceptor: 4.0,
            halogen: 4.0,
            anion: 8.0,
            cation: 8.0,
        }
    }
}

impl WeightConfig {
    pub fn get(&self, kind: FeatureKind) -> f64 {
        match kind {
            FeatureKind::Hydrophobic => self.hydrophobic,
            FeatureKind::Aromatic => self.aromatic,
            FeatureKind::HBondDonor => self.hbond_donor,
            FeatureKind::HBondAcceptor => self.hbond_acceptor,
            FeatureKind::Halogen => self.halogen,
            FeatureKind::Anion => self.anion,
            FeatureKind::Cation => self.cation,
        }
    }

    pub fn set(&mut self, kind: FeatureKind, value: f64) {
        let slot = match kind {
            FeatureKind::Hydrophobic => &mut self.hydrophobic,
            FeatureKind::Aromatic => &mut self.aromatic,
            FeatureKind::HBondDonor => &mut self.hbond_donor,
            FeatureKind::HBondAcceptor => &mut self.hbond_acceptor,
            FeatureKind::Halogen => &mut self.halogen,
            FeatureKind::Anion => &mut self.anion,
            FeatureKind::Cation => &mut self.cation,
        };
        *slot = value;
    }

    /// Iterates over `(kind, weight)` pairs in a fixed reporting order.
    pub fn iter(&self) -> impl Iterator<Item = (FeatureKind, f64)> + '_ {
        [
            FeatureKind::Cation,
            FeatureKind::Anion,
            FeatureKind::Aromatic,
            FeatureKind::HBondDonor,
            FeatureKind::HBondAcceptor,
            FeatureKind::Halogen,
            FeatureKind::Hydrophobic,
        ]
        .into_iter()
        .map(|kind| (kind, self.get(kind)))
    }

    pub fn validate(&self) -> Result<(), InvalidWeight> {
        match self.iter().find(|&(_, w)| !w.is_finite() || w < 0.0) {
            Some((kind, value)) => Err(InvalidWeight { kind, value }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_weights() {
        let w = WeightConfig::default();
        assert_eq!(w.get(FeatureKind::Hydrophobic), 1.0);
        assert_eq!(w.get(FeatureKind::Aromatic), 4.0);
        assert_eq!(w.get(FeatureKind::HBondAcceptor), 4.0);
        assert_eq!(w.get(FeatureKind::HBondDonor), 4.0);
        assert_eq!(w.get(FeatureKind::Halogen), 4.0);
        assert_eq!(w.get(FeatureKind::Anion), 8.0);
        assert_eq!(w.get(FeatureKind::Cation), 8.0);
    }

    #[test]
    fn set_updates_only_the_named_feature() {
        let mut w = WeightConfig::default();
        w.set(FeatureKind::Halogen, 0.5);
        assert_eq!(w.halogen, 0.5);
        assert_eq!(w.aromatic, 4.0);
    }

    #[test]
    fn iter_covers_every_feature_once() {
        let mut kinds: Vec<_> = WeightConfig::default().iter().map(|(k, _)| k).collect();
        kinds.sort();
        assert_eq!(kinds, FeatureKind::ALL.to_vec());
    }

    #[test]
    fn validate_rejects_negative_and_non_finite_weights() {
        assert!(WeightConfig::default().validate().is_ok());

        let mut w = WeightConfig::default();
        w.anion = -1.0;
        assert_eq!(
            w.validate(),
            Err(InvalidWeight {
                kind: FeatureKind::Anion,
                value: -1.0
            })
        );

        let mut w = WeightConfig::default();
        w.hydrophobic = f64::NAN;
        assert!(w.validate().is_err());
    }
}
