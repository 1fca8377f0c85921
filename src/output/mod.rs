pub mod writer;

pub use writer::{write_json, write_lines};
