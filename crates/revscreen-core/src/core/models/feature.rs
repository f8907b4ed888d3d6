use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The chemical feature categories a pharmacophore hotspot can demand from a ligand.
///
/// The string form of each variant (e.g. `HBond_donor`) is the key used in model
/// files, weight tables and log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FeatureKind {
    Hydrophobic,
    Aromatic,
    #[serde(rename = "HBond_donor", alias = "hbd")]
    HBondDonor,
    #[serde(rename = "HBond_acceptor", alias = "hba")]
    HBondAcceptor,
    Halogen,
    Anion,
    Cation,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 7] = [
        FeatureKind::Hydrophobic,
        FeatureKind::Aromatic,
        FeatureKind::HBondDonor,
        FeatureKind::HBondAcceptor,
        FeatureKind::Halogen,
        FeatureKind::Anion,
        FeatureKind::Cation,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            FeatureKind::Hydrophobic => "Hydrophobic",
            FeatureKind::Aromatic => "Aromatic",
            FeatureKind::HBondDonor => "HBond_donor",
            FeatureKind::HBondAcceptor => "HBond_acceptor",
            FeatureKind::Halogen => "Halogen",
            FeatureKind::Anion => "Anion",
            FeatureKind::Cation => "Cation",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown pharmacophore feature kind '{0}'")]
pub struct ParseFeatureKindError(pub String);

impl FromStr for FeatureKind {
    type Err = ParseFeatureKindError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "hydrophobic" => Ok(Self::Hydrophobic),
            "aromatic" => Ok(Self::Aromatic),
            "hbond_donor" | "hbd" => Ok(Self::HBondDonor),
            "hbond_acceptor" | "hba" => Ok(Self::HBondAcceptor),
            "halogen" => Ok(Self::Halogen),
            "anion" => Ok(Self::Anion),
            "cation" => Ok(Self::Cation),
            _ => Err(ParseFeatureKindError(s.to_string())),
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}
