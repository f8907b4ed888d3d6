use crate::core::chem::conformer::ConformerError;
use crate::core::io::StructureReadError;
use crate::core::io::model_file::ModelFileError;
use crate::core::io::smiles::SmilesError;
use std::time::Duration;
use thiserror::Error;

/// Task-level failure while loading a model or scoring a query against it.
///
/// These never abort a run: the worker converts them into the failure sentinel.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("Failed to load pharmacophore model: {0}")]
    ModelLoad(#[from] ModelFileError),

    #[error("Failed to parse SMILES: {0}")]
    Smiles(#[from] SmilesError),

    #[error("Failed to read query structure: {0}")]
    Structure(#[from] StructureReadError),

    #[error("Conformer generation failed: {0}")]
    Conformer(#[from] ConformerError),

    #[error("Scoring did not finish within {0:?}")]
    TimedOut(Duration),

    #[error("Scoring task panicked: {0}")]
    Panicked(String),

    #[error("{0}")]
    Other(String),
}
