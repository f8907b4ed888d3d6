//! # Workflows Module
//!
//! High-level entry points that run a complete procedure from inputs on disk to
//! outputs on disk, reporting progress along the way.
//!
//! - **Screening** ([`screen`]): scans a model database, loads the queries, scores
//!   every (query, model) pair in parallel, ranks and filters per query and writes the
//!   combined result table.
//! - **Analysis** ([`analyze`]): summarizes an existing result table and writes a
//!   plain-text report.

pub mod analyze;
pub mod screen;
