pub mod config;
pub mod discover;
pub mod error;
pub mod external;
pub mod filter;
pub mod gather;
pub mod http_client;
pub mod output;
pub mod pipeline;
pub mod probe;
pub mod targets;
pub mod utils;

// re-export modules used in tests
pub use crate::error::{ReconError, ReconResult};
pub use crate::filter::*;
