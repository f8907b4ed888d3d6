//! Cheminformatics primitives used by the built-in scorer: pharmacophoric feature
//! perception on molecular graphs and randomized 3D conformer embedding.

pub mod conformer;
pub mod perception;
