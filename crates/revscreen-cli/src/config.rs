//! Run configuration for the CLI: built-in defaults, an optional TOML file and
//! command-line overrides, merged in that order of increasing precedence.

pub mod builder;
pub mod defaults;
pub mod file;
