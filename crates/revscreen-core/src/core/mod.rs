//! # Core Module
//!
//! The stateless foundation of the crate.
//!
//! - [`models`]: feature categories, hotspots, molecules and queries.
//! - [`io`]: ligand structure readers (SDF, MOL2, PDB), the SMILES parser and the
//!   `.pm` pharmacophore model file format.
//! - [`chem`]: feature perception and conformer embedding.
//! - [`scoring`]: feature weights, the match function and the scoring traits.

pub mod chem;
pub mod io;
pub mod models;
pub mod scoring;
