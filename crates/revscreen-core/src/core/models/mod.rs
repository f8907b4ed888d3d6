//! Stateless data models shared by every layer of the crate.
//!
//! - [`feature`]: the seven pharmacophore feature categories.
//! - [`hotspot`]: labeled 3D feature points that make up a protein pharmacophore.
//! - [`molecule`]: small-molecule graphs with coordinates.
//! - [`query`]: the immutable query record screened against a model database.

pub mod feature;
pub mod hotspot;
pub mod molecule;
pub mod query;
