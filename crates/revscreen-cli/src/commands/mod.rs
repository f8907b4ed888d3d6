pub mod analyze;
pub mod screen;
