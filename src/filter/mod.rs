pub mod url_patterns;

pub use url_patterns::{CategoryMatcher, CategoryState, Categorized, UrlCategory};
