//! Pharmacophore scoring: feature weights, the conformer match function, and the
//! model-loading traits through which the engine consumes a scoring capability.

pub mod error;
pub mod matching;
pub mod model;
pub mod weights;

pub use error::ScoringError;
pub use model::{ModelLoader, PharmacophoreModel};
pub use weights::WeightConfig;
