pub mod runner;
pub mod tools;

pub use runner::{output_lines, SearchPath, ToolCommand, ToolRunner};
