pub mod config;
pub mod dispatcher;
pub mod error;
pub mod loader;
pub mod progress;
pub mod ranking;
pub mod scanner;
pub mod sink;
pub mod stats;
pub mod worker;
