pub mod url_finder;

pub use url_finder::{UrlFinder, UrlReport};
