//! # revscreen Core Library
//!
//! A reverse-screening engine for target fishing: ranks a database of protein
//! pharmacophore models by how well their feature hotspots match one or more query
//! molecules.
//!
//! ## Architectural Philosophy
//!
//! The library follows a strict three-layer architecture.
//!
//! - **[`core`]: The Foundation.** Stateless data models (`Molecule`, `Hotspot`, `Query`),
//!   structure and model file formats, feature perception, conformer embedding and the
//!   scoring traits (`ModelLoader`, `PharmacophoreModel`).
//!
//! - **[`engine`]: The Logic Core.** Run configuration, the model repository scanner,
//!   the query loader, the fault-isolating scoring worker, the per-query parallel
//!   dispatcher, ranking, the result sink and summary statistics.
//!
//! - **[`workflows`]: The Public API.** Complete procedures that tie `engine` and `core`
//!   together: [`workflows::screen::run`] for a screening run and
//!   [`workflows::analyze::run`] for summarizing a results table.

pub mod core;
pub mod engine;
pub mod workflows;
